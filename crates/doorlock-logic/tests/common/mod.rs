//! Test doubles shared by the logic integration tests.
//!
//! - [`ScriptedBackend`]: a backend whose answers and capabilities are set
//!   by the test, plus a [`BackendState`] clone to inject events.
//! - [`RecordingHooks`] / [`RecordingSounds`]: remember what was fired.
//! - [`subscribe`]: route status updates into a channel.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use doorlock_backend::{BackendState, DoorBackend, StateChangedHandler};
use doorlock_core::DoorState;
use doorlock_logic::{DoorHandler, Hook, HookRunner, SoundCue, SoundPlayer, StatusUpdate};
use tokio::sync::mpsc;

pub const OPEN_CLOSED: [DoorState; 2] = [DoorState::Open, DoorState::Closed];

#[derive(Debug)]
pub struct ScriptedBackend {
    pub state: BackendState,
    accept: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
    capabilities: &'static [DoorState],
}

/// Test-side controls of a [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub struct BackendControl {
    pub state: BackendState,
    accept: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, BackendControl) {
        Self::with_capabilities(&DoorState::ALL)
    }

    pub fn with_capabilities(capabilities: &'static [DoorState]) -> (Self, BackendControl) {
        let state = BackendState::new(DoorState::Closed);
        let accept = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicUsize::new(0));
        let control = BackendControl {
            state: state.clone(),
            accept: Arc::clone(&accept),
            calls: Arc::clone(&calls),
        };
        let backend = Self {
            state,
            accept,
            calls,
            delay: Duration::ZERO,
            capabilities,
        };
        (backend, control)
    }

    /// Make every `set_state` take `delay` before answering.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl DoorBackend for ScriptedBackend {
    async fn set_state(&self, target: DoorState) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !self.accept.load(Ordering::SeqCst) {
            return false;
        }
        self.state.set_confirmed(target);
        true
    }

    fn get_state(&self) -> DoorState {
        self.state.get()
    }

    fn register_state_changed_handler(&mut self, handler: StateChangedHandler) {
        self.state.register(handler);
    }

    fn sequence(&self) -> u64 {
        self.state.sequence()
    }

    fn capabilities(&self) -> &'static [DoorState] {
        self.capabilities
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

impl BackendControl {
    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct RecordingHooks(Mutex<Vec<Hook>>);

impl RecordingHooks {
    pub fn fired(&self) -> Vec<Hook> {
        self.0.lock().unwrap().clone()
    }
}

impl HookRunner for RecordingHooks {
    fn run(&self, hook: Hook) {
        self.0.lock().unwrap().push(hook);
    }
}

#[derive(Debug, Default)]
pub struct RecordingSounds(Mutex<Vec<SoundCue>>);

impl RecordingSounds {
    pub fn played(&self) -> Vec<SoundCue> {
        self.0.lock().unwrap().clone()
    }
}

impl SoundPlayer for RecordingSounds {
    fn play(&self, cue: SoundCue) {
        self.0.lock().unwrap().push(cue);
    }
}

/// Handler wired to recording hooks and sounds.
pub struct Rig<B> {
    pub handler: Arc<DoorHandler<B>>,
    pub hooks: Arc<RecordingHooks>,
    pub sounds: Arc<RecordingSounds>,
    pub updates: mpsc::UnboundedReceiver<StatusUpdate>,
}

pub fn rig<B: DoorBackend + 'static>(backend: B) -> Rig<B> {
    let hooks = Arc::new(RecordingHooks::default());
    let sounds = Arc::new(RecordingSounds::default());
    let handler = DoorHandler::start(backend, hooks.clone(), sounds.clone());
    let updates = subscribe(&handler);
    Rig {
        handler,
        hooks,
        sounds,
        updates,
    }
}

pub fn subscribe<B: DoorBackend>(handler: &DoorHandler<B>) -> mpsc::UnboundedReceiver<StatusUpdate> {
    let (tx, rx) = mpsc::unbounded_channel();
    handler.register_callback(Arc::new(move |update: StatusUpdate| {
        let _ = tx.send(update);
    }));
    rx
}

/// Next status update, failing the test after a second.
pub async fn next_update(updates: &mut mpsc::UnboundedReceiver<StatusUpdate>) -> StatusUpdate {
    tokio::time::timeout(Duration::from_secs(1), updates.recv())
        .await
        .expect("no status update")
        .expect("callback channel closed")
}
