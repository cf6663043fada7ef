//! Simulated backend for development and testing.
//!
//! Accepts every command. Button presses and emergency unlocks are injected
//! through a [`SimulationHandle`].

use doorlock_core::DoorState;
use tracing::info;

use crate::traits::{BackendState, DoorBackend, StateChangedHandler};

/// Backend without hardware.
///
/// # Examples
///
/// ```
/// use doorlock_backend::simulation::SimulationBackend;
/// use doorlock_backend::traits::DoorBackend;
/// use doorlock_core::DoorState;
///
/// #[tokio::main]
/// async fn main() {
///     let (backend, handle) = SimulationBackend::new();
///
///     assert!(backend.set_state(DoorState::Open).await);
///     assert_eq!(backend.get_state(), DoorState::Open);
///
///     // Someone presses the lock button
///     assert!(handle.press_button(DoorState::Closed));
///     assert_eq!(backend.get_state(), DoorState::Closed);
/// }
/// ```
#[derive(Debug)]
pub struct SimulationBackend {
    state: BackendState,
}

/// Drives a [`SimulationBackend`] from the outside.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    state: BackendState,
}

impl SimulationBackend {
    /// Create a simulated backend in the `Closed` state.
    pub fn new() -> (Self, SimulationHandle) {
        let state = BackendState::new(DoorState::Closed);
        let handle = SimulationHandle {
            state: state.clone(),
        };
        (Self { state }, handle)
    }

    /// Another handle driving this backend.
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            state: self.state.clone(),
        }
    }
}

impl DoorBackend for SimulationBackend {
    async fn set_state(&self, target: DoorState) -> bool {
        info!(%target, "Simulated door moved");
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

    fn name(&self) -> &'static str {
        "simulation"
    }
}

impl SimulationHandle {
    /// Simulate a door button. Returns `false` if the door already was in
    /// `state`, in which case no event is emitted.
    pub fn press_button(&self, state: DoorState) -> bool {
        info!(%state, "Simulated button press");
        self.state.report_external(state)
    }

    pub fn emergency_unlock(&self) {
        info!("Simulated emergency unlock");
        self.state.report_emergency();
    }

    /// Current state of the simulated door.
    pub fn state(&self) -> DoorState {
        self.state.get()
    }
}
