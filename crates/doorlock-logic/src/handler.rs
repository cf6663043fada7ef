//! The door state machine.
//!
//! [`DoorHandler`] owns the authoritative [`DoorState`] and the active
//! backend. The state is written from exactly two places, both under the
//! same lock:
//!
//! - [`request`](DoorHandler::request): an operator asks for a state; the
//!   backend must confirm before anything changes.
//! - [`state_changed`](DoorHandler::state_changed): the backend observed a
//!   transition it did not cause (button, controller timeout, bridge poll).
//!
//! A backend report can sit in the event queue while a request holds the
//! lock. Reports stamped with a backend sequence older than the last
//! confirmed request describe a state that request has already replaced and
//! are dropped.
//!
//! Every confirmed transition is recorded in the history, fires the hook of
//! the target state, plays a cue and notifies the status callback. The lock
//! is held until the callback returns, so notifications arrive in the order
//! the transitions happened.

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use doorlock_backend::{BackendEvent, DoorBackend};
use doorlock_core::{DoorState, Response};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, info, warn};

use crate::history::{Transition, TransitionHistory};
use crate::hooks::{Hook, HookRunner};
use crate::sound::{SoundCue, SoundPlayer, TransitionOrigin};

/// What the status callback receives: the state after the event and the
/// response describing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub state: DoorState,
    pub response: Response,
}

/// Notification sink for status updates.
///
/// Called with the state lock held. It must not call back into the handler.
pub type StatusCallback = Arc<dyn Fn(StatusUpdate) + Send + Sync>;

#[derive(Debug)]
struct Current {
    state: DoorState,
    /// Backend sequence right after the last confirmed request.
    confirmed_seq: u64,
}

pub struct DoorHandler<B> {
    backend: B,
    state: AsyncMutex<Current>,
    hooks: Arc<dyn HookRunner>,
    sounds: Arc<dyn SoundPlayer>,
    callback: RwLock<Option<StatusCallback>>,
    history: Mutex<TransitionHistory>,
}

impl<B: DoorBackend + 'static> DoorHandler<B> {
    /// Take ownership of `backend`, subscribe to its events and start the
    /// task that feeds them into [`state_changed`](Self::state_changed).
    ///
    /// The door is assumed `Closed` at startup.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        mut backend: B,
        hooks: Arc<dyn HookRunner>,
        sounds: Arc<dyn SoundPlayer>,
    ) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        backend.register_state_changed_handler(events_tx);
        info!(backend = backend.name(), "Starting door handler");

        let current = Current {
            state: DoorState::Closed,
            confirmed_seq: backend.sequence(),
        };
        let handler = Arc::new(Self {
            backend,
            state: AsyncMutex::new(current),
            hooks,
            sounds,
            callback: RwLock::new(None),
            history: Mutex::new(TransitionHistory::new()),
        });
        tokio::spawn(Self::pump_events(Arc::downgrade(&handler), events_rx));
        handler
    }

    async fn pump_events(handler: Weak<Self>, mut events: mpsc::UnboundedReceiver<BackendEvent>) {
        while let Some(event) = events.recv().await {
            let Some(handler) = handler.upgrade() else {
                break;
            };
            match event {
                BackendEvent::StateChanged { state, seq } => handler.observed(state, seq).await,
                BackendEvent::EmergencyUnlock => handler.emergency_unlock().await,
            }
        }
        debug!("Backend event stream ended");
    }
}

impl<B: DoorBackend> DoorHandler<B> {
    /// Drive the door to `target`.
    ///
    /// - `AlreadyActive` if the door is already there. Nothing else happens.
    /// - `Invalid` if the backend cannot actuate `target`.
    /// - `BackendError` if the backend did not confirm. The state is unchanged.
    /// - `Success` once the backend confirmed.
    pub async fn request(&self, target: DoorState) -> Response {
        let mut current = self.state.lock().await;
        let old = current.state;

        if target == old {
            info!(state = %target, "Requested state already active");
            return Response::AlreadyActive;
        }
        if !self.backend.capabilities().contains(&target) {
            warn!(
                state = %target,
                backend = self.backend.name(),
                "Backend cannot actuate requested state"
            );
            return Response::Invalid;
        }
        if !self.backend.set_state(target).await {
            warn!(from = %old, to = %target, "Backend did not confirm transition");
            return Response::BackendError;
        }

        current.state = target;
        current.confirmed_seq = self.backend.sequence();
        self.complete_transition(old, target, TransitionOrigin::Commanded);
        Response::Success
    }

    /// Apply a transition the backend observed on its own. A no-op if the
    /// door already is in `new_state`.
    pub async fn state_changed(&self, new_state: DoorState) {
        let mut current = self.state.lock().await;
        self.apply_unsolicited(&mut current, new_state);
    }

    /// A backend report stamped with sequence `seq`.
    async fn observed(&self, new_state: DoorState, seq: u64) {
        let mut current = self.state.lock().await;
        if seq < current.confirmed_seq {
            info!(
                state = %new_state,
                seq,
                confirmed_seq = current.confirmed_seq,
                "Dropping backend report older than the last command"
            );
            return;
        }
        self.apply_unsolicited(&mut current, new_state);
    }

    fn apply_unsolicited(&self, current: &mut Current, new_state: DoorState) {
        let old = current.state;
        if new_state == old {
            debug!(state = %new_state, "Backend reported current state, ignoring");
            return;
        }

        current.state = new_state;
        self.complete_transition(old, new_state, TransitionOrigin::Unsolicited);
    }

    /// The controller's emergency input fired. The door state is left alone.
    pub async fn emergency_unlock(&self) {
        let state = self.state.lock().await.state;
        warn!(%state, "Emergency unlock");
        self.sounds.play(SoundCue::Zonk);
        self.notify(state, Response::EmergencyUnlock);
    }

    fn complete_transition(&self, old: DoorState, new: DoorState, origin: TransitionOrigin) {
        info!(from = %old, to = %new, ?origin, "Door state changed");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Transition::new(old, new, origin));

        self.hooks.run(Hook::for_state(new));
        self.sounds.play(SoundCue::select(old, new, origin));

        let response = match origin {
            TransitionOrigin::Commanded => Response::Success,
            TransitionOrigin::Unsolicited => Response::unsolicited_for(new),
        };
        self.notify(new, response);
    }

    fn notify(&self, state: DoorState, response: Response) {
        let callback = self
            .callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match callback {
            Some(callback) => callback(StatusUpdate { state, response }),
            None => debug!(%state, ?response, "No status callback registered"),
        }
    }

    /// Send `response` to the status callback along with the current state.
    pub async fn invoke_callback(&self, response: Response) {
        let current = self.state.lock().await;
        self.notify(current.state, response);
    }

    /// Replace the status callback.
    pub fn register_callback(&self, callback: StatusCallback) {
        *self.callback.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    pub async fn current_state(&self) -> DoorState {
        self.state.lock().await.state
    }

    /// Recent confirmed transitions, oldest first.
    pub fn history(&self) -> Vec<Transition> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: DoorBackend> std::fmt::Debug for DoorHandler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorHandler")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
