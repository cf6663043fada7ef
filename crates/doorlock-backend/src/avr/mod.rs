//! AVR microcontroller backend.
//!
//! The controller sits on a 9600 8N1 serial line and speaks the single-byte
//! protocol in [`protocol`]. A dedicated thread owns the link (see
//! [`reader`]); `set_state` hands it a command and waits for the outcome.

pub mod link;
pub mod protocol;
mod reader;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use doorlock_core::DoorState;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

use self::link::{SerialLink, open_serial};
use self::reader::{PendingCommand, Reader};
use crate::config::SerialConfig;
use crate::error::{BackendError, Result};
use crate::traits::{BackendState, DoorBackend, StateChangedHandler};

/// Door backend driving the AVR controller.
#[derive(Debug)]
pub struct AvrBackend {
    device: String,
    state: BackendState,
    commands: mpsc::Sender<PendingCommand>,
    command_lock: Mutex<()>,
    command_timeout: Duration,
    shutdown: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl AvrBackend {
    /// Open the configured serial device and start the reader thread.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = open_serial(config)?;
        Self::with_link(port, config)
    }

    /// Start the reader on an already opened link.
    pub fn with_link<L: SerialLink>(link: L, config: &SerialConfig) -> Result<Self> {
        let state = BackendState::new(DoorState::Closed);
        let (commands, receiver) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        let reader = Reader {
            link,
            state: state.clone(),
            commands: receiver,
            shutdown: Arc::clone(&shutdown),
            alive: Arc::clone(&alive),
            poll_interval: config.poll_interval(),
            ack_timeout: config.ack_timeout(),
        };
        let handle = std::thread::Builder::new()
            .name("avr-reader".to_string())
            .spawn(move || reader.run())?;

        Ok(Self {
            device: config.device.clone(),
            state,
            commands,
            command_lock: Mutex::new(()),
            command_timeout: config.command_timeout(),
            shutdown,
            alive,
            reader: Some(handle),
        })
    }

    /// Returns `false` once the reader has stopped, e.g. after a link error.
    pub fn is_link_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl DoorBackend for AvrBackend {
    async fn set_state(&self, target: DoorState) -> bool {
        let _guard = self.command_lock.lock().await;

        let (reply, outcome) = oneshot::channel();
        if self.commands.send(PendingCommand { target, reply }).is_err() {
            let error = BackendError::disconnected(&self.device);
            warn!(%target, %error, "AVR reader is not running");
            return false;
        }

        match tokio::time::timeout(self.command_timeout, outcome).await {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(_)) => {
                let error = BackendError::disconnected(&self.device);
                warn!(%target, %error, "AVR reader stopped before answering");
                false
            }
            Err(_) => {
                let error = BackendError::timeout(self.command_timeout.as_millis() as u64);
                warn!(%target, %error, "AVR command timed out");
                false
            }
        }
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
        "avr"
    }
}

impl Drop for AvrBackend {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        // The reader exits within one poll interval; no need to block here.
        if let Some(handle) = self.reader.take() {
            debug!(finished = handle.is_finished(), "Dropping AVR backend");
        }
    }
}
