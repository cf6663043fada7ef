//! Enum wrapper for runtime backend selection.
//!
//! [`DoorBackend`] returns `impl Future` from `set_state` and is therefore not
//! object-safe. The daemon picks its backend from configuration at startup,
//! so [`AnyBackend`] dispatches to the concrete type with a `match`.

use doorlock_core::DoorState;
use tracing::info;

use crate::avr::AvrBackend;
use crate::bridge::NukiBridgeBackend;
use crate::config::BackendConfig;
use crate::error::Result;
use crate::simulation::{SimulationBackend, SimulationHandle};
use crate::traits::{DoorBackend, StateChangedHandler};

#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBackend {
    Avr(AvrBackend),
    NukiBridge(NukiBridgeBackend),
    Simulation(SimulationBackend),
}

impl AnyBackend {
    /// Build the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the serial device
    /// cannot be opened, or the bridge device cannot be resolved.
    pub async fn from_config(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        let backend = match config {
            BackendConfig::Avr(serial) => Self::Avr(AvrBackend::open(serial)?),
            BackendConfig::NukiBridge(bridge) => {
                Self::NukiBridge(NukiBridgeBackend::connect(bridge).await?)
            }
            BackendConfig::Simulation => Self::Simulation(SimulationBackend::new().0),
        };
        info!(backend = backend.name(), "Backend ready");
        Ok(backend)
    }

    /// Handle for injecting button presses, if this is the simulation
    /// backend.
    pub fn simulation_handle(&self) -> Option<SimulationHandle> {
        match self {
            Self::Simulation(backend) => Some(backend.handle()),
            _ => None,
        }
    }
}

impl DoorBackend for AnyBackend {
    async fn set_state(&self, target: DoorState) -> bool {
        match self {
            Self::Avr(backend) => backend.set_state(target).await,
            Self::NukiBridge(backend) => backend.set_state(target).await,
            Self::Simulation(backend) => backend.set_state(target).await,
        }
    }

    fn get_state(&self) -> DoorState {
        match self {
            Self::Avr(backend) => backend.get_state(),
            Self::NukiBridge(backend) => backend.get_state(),
            Self::Simulation(backend) => backend.get_state(),
        }
    }

    fn register_state_changed_handler(&mut self, handler: StateChangedHandler) {
        match self {
            Self::Avr(backend) => backend.register_state_changed_handler(handler),
            Self::NukiBridge(backend) => backend.register_state_changed_handler(handler),
            Self::Simulation(backend) => backend.register_state_changed_handler(handler),
        }
    }

    fn sequence(&self) -> u64 {
        match self {
            Self::Avr(backend) => backend.sequence(),
            Self::NukiBridge(backend) => backend.sequence(),
            Self::Simulation(backend) => backend.sequence(),
        }
    }

    fn capabilities(&self) -> &'static [DoorState] {
        match self {
            Self::Avr(backend) => backend.capabilities(),
            Self::NukiBridge(backend) => backend.capabilities(),
            Self::Simulation(backend) => backend.capabilities(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Avr(backend) => backend.name(),
            Self::NukiBridge(backend) => backend.name(),
            Self::Simulation(backend) => backend.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerialConfig;

    #[tokio::test]
    async fn test_simulation_from_config() {
        let backend = AnyBackend::from_config(&BackendConfig::Simulation).await.unwrap();
        assert_eq!(backend.name(), "simulation");
        assert!(backend.set_state(DoorState::Present).await);
        assert_eq!(backend.get_state(), DoorState::Present);
    }

    #[tokio::test]
    async fn test_simulation_handle_reaches_backend() {
        let mut backend = AnyBackend::from_config(&BackendConfig::Simulation).await.unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        backend.register_state_changed_handler(tx);

        let handle = backend.simulation_handle().expect("simulation backend has a handle");
        assert!(handle.press_button(DoorState::Open));
        assert_eq!(backend.get_state(), DoorState::Open);
        assert_eq!(rx.recv().await.and_then(|event| event.state()), Some(DoorState::Open));
    }

    #[tokio::test]
    async fn test_missing_serial_device() {
        let config = BackendConfig::Avr(SerialConfig {
            device: "/nonexistent/ttyDOOR".to_string(),
            ..SerialConfig::default()
        });
        assert!(AnyBackend::from_config(&config).await.is_err());
    }

    #[test]
    fn test_config_tagging() {
        let config: BackendConfig = parse_config(r#"{"type": "simulation"}"#);
        assert_eq!(config, BackendConfig::Simulation);

        let config: BackendConfig = parse_config(r#"{"type": "avr", "device": "/dev/ttyUSB0"}"#);
        match config {
            BackendConfig::Avr(serial) => {
                assert_eq!(serial.device, "/dev/ttyUSB0");
                assert_eq!(serial.baud_rate, 9600);
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    fn parse_config(json: &str) -> BackendConfig {
        serde_json::from_str(json).unwrap()
    }
}
