//! Door lock backends.
//!
//! A backend moves the physical lock and reports what the lock does on its
//! own. Three implementations exist:
//!
//! - [`AvrBackend`]: AVR controller on a serial line, with door buttons and
//!   an emergency input.
//! - [`NukiBridgeBackend`]: Nuki smart lock polled through a Nuki bridge.
//!   Supports `Open` and `Closed` only.
//! - [`SimulationBackend`]: accepts everything, driven by a handle in tests
//!   and during development.
//!
//! All of them implement [`DoorBackend`]; [`AnyBackend`] selects one from a
//! [`BackendConfig`] at runtime.
//!
//! ```
//! use doorlock_backend::{DoorBackend, SimulationBackend};
//! use doorlock_core::DoorState;
//!
//! async fn unlock<B: DoorBackend>(backend: &B) -> bool {
//!     backend.capabilities().contains(&DoorState::Open)
//!         && backend.set_state(DoorState::Open).await
//! }
//! # let _ = SimulationBackend::new();
//! ```

pub mod any;
pub mod avr;
pub mod bridge;
pub mod config;
pub mod error;
pub mod simulation;
pub mod traits;

pub use any::AnyBackend;
pub use avr::AvrBackend;
pub use bridge::NukiBridgeBackend;
pub use config::{BackendConfig, BridgeConfig, SerialConfig};
pub use error::{BackendError, Result};
pub use simulation::{SimulationBackend, SimulationHandle};
pub use traits::{BackendEvent, BackendState, DoorBackend, EventSink, StateChangedHandler};
