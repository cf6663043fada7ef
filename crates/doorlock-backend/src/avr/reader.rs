//! Background loop that owns the serial link.
//!
//! Every cycle the reader sleeps for the poll interval, drains all buffered
//! bytes, then writes at most one queued command. Reads and writes never
//! interleave because this thread is the only one touching the link.
//!
//! The controller relocks unless it hears its current command again before
//! its timer expires. When no command is queued and the door is `Open` or
//! `Present`, the reader repeats that state's byte instead.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use doorlock_core::DoorState;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

use super::link::{ECHO_POLL, SerialLink, read_byte};
use super::protocol::{Inbound, command_byte};
use crate::error::BackendError;
use crate::traits::BackendState;

/// A `set_state` call waiting for the reader.
#[derive(Debug)]
pub(crate) struct PendingCommand {
    pub target: DoorState,
    pub reply: oneshot::Sender<bool>,
}

pub(crate) struct Reader<L> {
    pub link: L,
    pub state: BackendState,
    pub commands: Receiver<PendingCommand>,
    pub shutdown: Arc<AtomicBool>,
    pub alive: Arc<AtomicBool>,
    pub poll_interval: Duration,
    pub ack_timeout: Option<Duration>,
}

impl<L: SerialLink> Reader<L> {
    pub fn run(mut self) {
        info!("AVR reader started");
        loop {
            std::thread::sleep(self.poll_interval);
            if self.shutdown.load(Ordering::Acquire) {
                debug!("AVR reader shutting down");
                break;
            }

            if let Err(e) = self.drain() {
                error!(error = %e, "Serial link failed, stopping AVR reader");
                break;
            }

            let written = match self.commands.try_recv() {
                Ok(command) => self.execute(command),
                Err(TryRecvError::Empty) => self.refresh(),
                Err(TryRecvError::Disconnected) => {
                    debug!("AVR backend dropped, stopping reader");
                    break;
                }
            };
            if let Err(e) = written {
                error!(error = %e, "Serial write failed, stopping AVR reader");
                break;
            }
        }
        self.alive.store(false, Ordering::Release);
    }

    fn drain(&mut self) -> io::Result<()> {
        while let Some(byte) = read_byte(&mut self.link)? {
            self.dispatch(byte);
        }
        Ok(())
    }

    fn dispatch(&self, byte: u8) {
        match Inbound::decode(byte) {
            Some(Inbound::Button(state)) => {
                info!(%state, "Button pressed");
                self.state.report_external(state);
            }
            Some(Inbound::Report(state)) => {
                info!(%state, "Controller changed state");
                self.state.report_external(state);
            }
            Some(Inbound::Emergency) => {
                warn!("Emergency unlock reported by controller");
                self.state.report_emergency();
            }
            None => {
                let error = BackendError::invalid_data(format!("unknown byte {byte:#04x}"));
                warn!(%error, "Dropping byte from AVR");
            }
        }
    }

    /// Repeat the held state to the controller. Nothing is sent while closed.
    fn refresh(&mut self) -> io::Result<()> {
        let state = self.state.get();
        if state == DoorState::Closed {
            return Ok(());
        }
        let byte = command_byte(state);
        trace!(%state, byte = %char::from(byte), "Refreshing AVR state");
        self.link.write_all(&[byte])?;
        self.link.flush()
    }

    fn execute(&mut self, command: PendingCommand) -> io::Result<()> {
        let PendingCommand { target, reply } = command;
        if reply.is_closed() {
            debug!(%target, "Requester gave up, skipping command");
            return Ok(());
        }

        let byte = command_byte(target);
        debug!(%target, byte = %char::from(byte), "Sending command to AVR");
        if let Err(e) = self.link.write_all(&[byte]).and_then(|()| self.link.flush()) {
            let _ = reply.send(false);
            return Err(e);
        }

        let confirmed = match self.ack_timeout {
            None => true,
            Some(window) => self.await_echo(byte, window)?,
        };

        if !confirmed {
            warn!(%target, "No echo from AVR within acknowledgement window");
            let _ = reply.send(false);
            return Ok(());
        }

        // Confirm before replying so the requester sees the new sequence.
        self.state.set_confirmed(target);
        if reply.send(true).is_err() {
            // Nobody learns about this transition through set_state.
            warn!(%target, "Command confirmed after requester gave up");
            self.state.announce();
        }
        Ok(())
    }

    fn await_echo(&mut self, expected: u8, window: Duration) -> io::Result<bool> {
        let deadline = Instant::now() + window;
        while Instant::now() < deadline {
            match read_byte(&mut self.link)? {
                Some(byte) if byte == expected => return Ok(true),
                Some(byte) => {
                    warn!(
                        expected = %char::from(expected),
                        received = byte,
                        "Protocol desync while waiting for echo"
                    );
                    self.dispatch(byte);
                }
                None => std::thread::sleep(ECHO_POLL),
            }
        }
        Ok(false)
    }
}
