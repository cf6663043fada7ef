//! DoorHandler driving the AVR backend over an in-memory serial line.

mod common;

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{next_update, rig};
use doorlock_backend::{AvrBackend, DoorBackend, SerialConfig};
use doorlock_core::{DoorState, Response};
use doorlock_logic::{Hook, StatusUpdate};

#[derive(Debug, Default)]
struct Wire {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
}

/// Controller side of the serial line.
#[derive(Debug, Clone, Default)]
struct Controller(Arc<Mutex<Wire>>);

impl Controller {
    fn send(&self, bytes: &[u8]) {
        self.0.lock().unwrap().inbound.extend(bytes);
    }

    fn received(&self) -> Vec<u8> {
        let mut written = self.0.lock().unwrap().written.clone();
        written.dedup();
        written
    }
}

impl Read for Controller {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.lock().unwrap().inbound.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
        }
    }
}

impl Write for Controller {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn avr(controller: &Controller) -> AvrBackend {
    let config = SerialConfig {
        device: "fake".to_string(),
        poll_interval_ms: 20,
        ack_timeout_ms: None,
        command_timeout_ms: 1_000,
        ..SerialConfig::default()
    };
    AvrBackend::with_link(controller.clone(), &config).unwrap()
}

fn update(state: DoorState, response: Response) -> StatusUpdate {
    StatusUpdate { state, response }
}

#[tokio::test]
async fn test_button_overtaken_by_lock_command_is_dropped() {
    let controller = Controller::default();
    let mut rig = rig(avr(&controller));

    assert_eq!(rig.handler.request(DoorState::Open).await, Response::Success);
    // Pressed just before the lock command goes out; the reader sees both
    // in the same cycle.
    controller.send(b"Y");
    assert_eq!(rig.handler.request(DoorState::Closed).await, Response::Success);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(rig.handler.current_state().await, DoorState::Closed);
    assert_eq!(rig.handler.backend().get_state(), DoorState::Closed);
    assert_eq!(controller.received().last(), Some(&b'r'));

    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Open, Response::Success)
    );
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Closed, Response::Success)
    );
    assert!(rig.updates.try_recv().is_err());
    assert_eq!(rig.hooks.fired(), vec![Hook::PostUnlock, Hook::PostLock]);
}

#[tokio::test]
async fn test_button_after_command_is_applied() {
    let controller = Controller::default();
    let mut rig = rig(avr(&controller));

    assert_eq!(rig.handler.request(DoorState::Open).await, Response::Success);
    next_update(&mut rig.updates).await;

    controller.send(b"Y");
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Present, Response::ButtonPresent)
    );
    assert_eq!(rig.handler.current_state().await, DoorState::Present);

    // Held state is repeated to the controller.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.received(), b"gy");
}
