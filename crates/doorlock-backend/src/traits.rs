//! Backend trait definition and the event plumbing shared by all backends.
//!
//! A backend is the physical actuator behind the door: it accepts a target
//! state, confirms or rejects it, and reports state changes it observes on
//! its own (button presses, controller timeouts, a lock turned by hand).
//!
//! Observed changes are delivered as [`BackendEvent`]s over an unbounded tokio
//! channel registered with [`DoorBackend::register_state_changed_handler`].
//! Backends only emit events for genuine changes: after a successful
//! `set_state` the backend's own view already matches the target, so the
//! echo of a commanded transition is never reported back.
//!
//! Every confirmed command advances the backend's sequence number, and each
//! `StateChanged` carries the sequence it was observed under. A consumer that
//! remembers the sequence of its last confirmed command can tell an
//! observation made before that command from one made after it.

use doorlock_core::DoorState;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Events reported by a backend outside of a `set_state` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    /// The door reached a new state without being commanded to.
    ///
    /// `seq` is the backend's [`sequence`](DoorBackend::sequence) at the time
    /// of the observation.
    StateChanged { state: DoorState, seq: u64 },

    /// The controller reported its emergency unlock input.
    EmergencyUnlock,
}

impl BackendEvent {
    /// The reported state, if this is a state change.
    pub fn state(&self) -> Option<DoorState> {
        match self {
            Self::StateChanged { state, .. } => Some(*state),
            Self::EmergencyUnlock => None,
        }
    }
}

/// Channel on which a backend delivers its [`BackendEvent`]s.
pub type StateChangedHandler = mpsc::UnboundedSender<BackendEvent>;

/// Door lock backend abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// `set_state` returns `impl Future`, so the trait is not object-safe. Use a
/// generic parameter, or the [`AnyBackend`](crate::any::AnyBackend) enum
/// when the backend is selected at runtime.
///
/// # Contract
///
/// - `set_state` returns `true` only once the backend has accepted the
///   command (and, where the protocol allows it, confirmed it).
/// - A failed `set_state` never changes the value returned by `get_state`.
/// - Commands and link reads are serialized inside the backend.
pub trait DoorBackend: Send + Sync {
    /// Drive the door to `target`.
    fn set_state(&self, target: DoorState) -> impl Future<Output = bool> + Send;

    /// Last state the backend knows of.
    fn get_state(&self) -> DoorState;

    /// Install the channel for unsolicited events.
    ///
    /// Events observed before registration are buffered and flushed here.
    fn register_state_changed_handler(&mut self, handler: StateChangedHandler);

    /// Number of commands confirmed so far.
    fn sequence(&self) -> u64;

    /// States this backend can actuate.
    fn capabilities(&self) -> &'static [DoorState] {
        &DoorState::ALL
    }

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Events buffered before a handler is registered.
const PENDING_EVENT_LIMIT: usize = 32;

#[derive(Debug, Default)]
struct SinkInner {
    handler: Option<StateChangedHandler>,
    pending: Vec<BackendEvent>,
}

/// Shared slot holding the registered event handler.
///
/// Background tasks (serial reader, bridge poller) keep a clone and emit
/// through it, so the handler can be installed after they are running.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    inner: Arc<Mutex<SinkInner>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` and flush anything observed before it existed.
    pub fn register(&self, handler: StateChangedHandler) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;
        for event in inner.pending.drain(..) {
            if handler.send(event).is_err() {
                warn!(?event, "Event handler closed while flushing buffered events");
                break;
            }
        }
        inner.pending.clear();
        inner.handler = Some(handler);
    }

    /// Deliver `event`. Returns `false` if the receiving side is gone.
    pub fn emit(&self, event: BackendEvent) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;
        match &inner.handler {
            Some(handler) => {
                let delivered = handler.send(event).is_ok();
                if !delivered {
                    warn!(?event, "Event handler closed, dropping event");
                }
                delivered
            }
            None => {
                if inner.pending.len() >= PENDING_EVENT_LIMIT {
                    warn!(?event, "No event handler registered, dropping oldest event");
                    inner.pending.remove(0);
                }
                debug!(?event, "No event handler registered yet, buffering");
                inner.pending.push(event);
                true
            }
        }
    }
}

/// The backend's own view of the door, plus its event sink.
///
/// Every backend funnels state updates through this type so the echo rule
/// holds in one place: [`set_confirmed`](Self::set_confirmed) updates silently,
/// [`report_external`](Self::report_external) emits only on a real change.
#[derive(Debug, Clone)]
pub struct BackendState {
    current: Arc<Mutex<Observed>>,
    events: EventSink,
}

#[derive(Debug, Clone, Copy)]
struct Observed {
    state: DoorState,
    seq: u64,
}

impl BackendState {
    pub fn new(initial: DoorState) -> Self {
        Self {
            current: Arc::new(Mutex::new(Observed {
                state: initial,
                seq: 0,
            })),
            events: EventSink::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Observed> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> DoorState {
        self.lock().state
    }

    /// Number of [`set_confirmed`](Self::set_confirmed) calls so far.
    pub fn sequence(&self) -> u64 {
        self.lock().seq
    }

    /// Record a state the backend was commanded into and confirmed.
    ///
    /// Advances the sequence, so events emitted before this call carry a
    /// smaller one than the returned value.
    pub fn set_confirmed(&self, state: DoorState) -> u64 {
        let mut current = self.lock();
        current.state = state;
        current.seq += 1;
        current.seq
    }

    /// Record a state observed on the hardware.
    ///
    /// Emits [`BackendEvent::StateChanged`] and returns `true` only if it
    /// differs from the current view.
    pub fn report_external(&self, state: DoorState) -> bool {
        let mut current = self.lock();
        if current.state == state {
            debug!(%state, "Observed state matches current state, ignoring");
            return false;
        }
        current.state = state;
        // Emitting under the lock keeps events in observation order.
        self.events.emit(BackendEvent::StateChanged {
            state,
            seq: current.seq,
        });
        true
    }

    /// Emit the current state even though it did not change here.
    ///
    /// For a confirmation that no requester received.
    pub fn announce(&self) {
        let current = self.lock();
        self.events.emit(BackendEvent::StateChanged {
            state: current.state,
            seq: current.seq,
        });
    }

    pub fn report_emergency(&self) {
        self.events.emit(BackendEvent::EmergencyUnlock);
    }

    pub fn register(&self, handler: StateChangedHandler) {
        self.events.register(handler);
    }
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new(DoorState::Closed)
    }
}
