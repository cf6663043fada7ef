//! Nuki smart lock behind a Nuki bridge.
//!
//! The bridge has no push channel we rely on, so a tokio task polls the
//! device list every `poll_interval_ms`. Snapshots are compared with the
//! volatile fields removed; only a changed snapshot whose `stateName` maps
//! to a door state different from the current one produces an event.
//!
//! A Nuki lock only knows locked and unlocked. `Present` is not a capability
//! of this backend.

pub mod client;

use std::sync::Arc;

use doorlock_core::DoorState;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use self::client::{LockAction, NukiBridgeClient};
use crate::config::BridgeConfig;
use crate::error::{BackendError, Result};
use crate::traits::{BackendState, DoorBackend, StateChangedHandler};

const CAPABILITIES: &[DoorState] = &[DoorState::Open, DoorState::Closed];

/// Snapshot fields that change on every poll.
const VOLATILE_FIELDS: &[&str] = &["timestamp"];

/// Map a Nuki `stateName` to a door state.
pub fn map_state_name(name: &str) -> Option<DoorState> {
    match name {
        "locked" => Some(DoorState::Closed),
        "unlocked" | "unlatched" | "unlatching" | "unlocked (lock ‘n’ go)" => {
            Some(DoorState::Open)
        }
        _ => None,
    }
}

/// Remembers the last snapshot so unchanged polls are ignored.
#[derive(Debug, Default)]
pub struct PollTracker {
    last: Option<Map<String, Value>>,
}

impl PollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the remembered snapshot.
    pub fn forget(&mut self) {
        self.last = None;
    }

    /// Feed a new snapshot. Returns the mapped state if the snapshot changed
    /// and its `stateName` is one we understand.
    pub fn observe(&mut self, mut snapshot: Map<String, Value>) -> Option<DoorState> {
        for field in VOLATILE_FIELDS {
            snapshot.remove(*field);
        }
        if self.last.as_ref() == Some(&snapshot) {
            return None;
        }

        let state_name = snapshot
            .get("stateName")
            .and_then(Value::as_str)
            .map(str::to_owned);
        debug!(?snapshot, "Nuki reported new state");
        self.last = Some(snapshot);

        let name = state_name?;
        let mapped = map_state_name(&name);
        if mapped.is_none() {
            debug!(state_name = %name, "Ignoring transitional Nuki state");
        }
        mapped
    }
}

#[derive(Debug)]
struct Shared {
    client: NukiBridgeClient,
    nuki_id: u64,
    state: BackendState,
    // Serializes polls with commands so a stale poll cannot undo a command.
    io: Mutex<PollTracker>,
}

impl Shared {
    async fn poll_once(&self) {
        let mut tracker = self.io.lock().await;
        match self.client.device_state(self.nuki_id).await {
            Ok(Some(snapshot)) => {
                if let Some(observed) = tracker.observe(snapshot) {
                    self.state.report_external(observed);
                }
            }
            Ok(None) => {
                let error = BackendError::disconnected(format!("Nuki {}", self.nuki_id));
                warn!(%error, "Bridge did not list our device");
            }
            Err(e) => warn!(error = %e, "Bridge poll failed, retrying next interval"),
        }
    }
}

/// Door backend driving a Nuki lock through the bridge HTTP API.
#[derive(Debug)]
pub struct NukiBridgeBackend {
    shared: Arc<Shared>,
    poller: JoinHandle<()>,
}

impl NukiBridgeBackend {
    /// Resolve the configured device and start polling.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if the bridge cannot be listed or has
    /// no device with the configured name.
    pub async fn connect(config: &BridgeConfig) -> Result<Self> {
        let client = NukiBridgeClient::new(config)?;
        let nuki_id = client.resolve_device(&config.device_name).await.map_err(|e| match e {
            BackendError::ConfigurationError { .. } => e,
            other => BackendError::configuration(format!("unable to get Nuki device id: {other}")),
        })?;
        info!(device = %config.device_name, nuki_id, "Resolved Nuki device");

        let shared = Arc::new(Shared {
            client,
            nuki_id,
            state: BackendState::new(DoorState::Closed),
            io: Mutex::new(PollTracker::new()),
        });

        let interval = config.poll_interval();
        let poller = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    shared.poll_once().await;
                }
            }
        });

        Ok(Self { shared, poller })
    }

    pub fn nuki_id(&self) -> u64 {
        self.shared.nuki_id
    }
}

impl DoorBackend for NukiBridgeBackend {
    async fn set_state(&self, target: DoorState) -> bool {
        let action = match target {
            DoorState::Open => LockAction::Unlock,
            DoorState::Closed => LockAction::Lock,
            DoorState::Present => {
                let error = BackendError::unsupported(format!("{target} on a Nuki lock"));
                warn!(%error, "Refusing command");
                return false;
            }
        };

        let mut tracker = self.shared.io.lock().await;
        info!(%target, "Sending command to Nuki bridge");
        match self.shared.client.lock_action(self.shared.nuki_id, action).await {
            Ok(true) => {
                self.shared.state.set_confirmed(target);
                // Compare the next poll against the new state, not the old snapshot.
                tracker.forget();
                true
            }
            Ok(false) => {
                warn!(%target, "Nuki bridge reported failure");
                false
            }
            Err(e) => {
                warn!(%target, error = %e, "Nuki bridge request failed");
                false
            }
        }
    }

    fn get_state(&self) -> DoorState {
        self.shared.state.get()
    }

    fn register_state_changed_handler(&mut self, handler: StateChangedHandler) {
        self.shared.state.register(handler);
    }

    fn sequence(&self) -> u64 {
        self.shared.state.sequence()
    }

    fn capabilities(&self) -> &'static [DoorState] {
        CAPABILITIES
    }

    fn name(&self) -> &'static str {
        "nuki_bridge"
    }
}

impl Drop for NukiBridgeBackend {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn snapshot(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test snapshots are objects"),
        }
    }

    #[rstest]
    #[case("locked", Some(DoorState::Closed))]
    #[case("unlocked", Some(DoorState::Open))]
    #[case("unlatched", Some(DoorState::Open))]
    #[case("unlocked (lock ‘n’ go)", Some(DoorState::Open))]
    #[case("locking", None)]
    #[case("motor blocked", None)]
    fn test_map_state_name(#[case] name: &str, #[case] expected: Option<DoorState>) {
        assert_eq!(map_state_name(name), expected);
    }

    #[test]
    fn test_tracker_ignores_timestamp_only_changes() {
        let mut tracker = PollTracker::new();
        let first = tracker.observe(snapshot(json!({
            "stateName": "locked", "timestamp": "2024-01-01T10:00:00+00:00"
        })));
        assert_eq!(first, Some(DoorState::Closed));

        let second = tracker.observe(snapshot(json!({
            "stateName": "locked", "timestamp": "2024-01-01T10:00:10+00:00"
        })));
        assert_eq!(second, None);
    }

    #[test]
    fn test_tracker_reports_changed_state() {
        let mut tracker = PollTracker::new();
        tracker.observe(snapshot(json!({"stateName": "locked"})));
        assert_eq!(
            tracker.observe(snapshot(json!({"stateName": "unlocked"}))),
            Some(DoorState::Open)
        );
    }

    #[test]
    fn test_tracker_transitional_state() {
        let mut tracker = PollTracker::new();
        assert_eq!(tracker.observe(snapshot(json!({"stateName": "unlocking"}))), None);
        assert_eq!(
            tracker.observe(snapshot(json!({"stateName": "unlocked"}))),
            Some(DoorState::Open)
        );
    }
}
