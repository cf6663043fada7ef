//! Single-byte protocol spoken by the AVR door controller.
//!
//! | Byte | Direction       | Meaning                                  |
//! |------|-----------------|------------------------------------------|
//! | `r`  | host -> AVR     | lock                                     |
//! | `y`  | host -> AVR     | present                                  |
//! | `g`  | host -> AVR     | unlock                                   |
//! | `R`  | AVR -> host     | lock button pressed                      |
//! | `Y`  | AVR -> host     | present button pressed                   |
//! | `G`  | AVR -> host     | unlock button pressed                    |
//! | `r`  | AVR -> host     | controller relocked on its own           |
//! | `y`  | AVR -> host     | controller switched to present on its own|
//! | `g`  | AVR -> host     | controller unlocked on its own           |
//! | `E`  | AVR -> host     | emergency unlock input                   |
//!
//! With acknowledgements enabled the controller echoes the command byte.

use doorlock_core::DoorState;

pub const CMD_LOCK: u8 = b'r';
pub const CMD_PRESENT: u8 = b'y';
pub const CMD_UNLOCK: u8 = b'g';
pub const BUTTON_LOCK: u8 = b'R';
pub const BUTTON_PRESENT: u8 = b'Y';
pub const BUTTON_UNLOCK: u8 = b'G';
pub const EMERGENCY_UNLOCK: u8 = b'E';

/// Decoded byte received from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// One of the door buttons was pressed.
    Button(DoorState),
    /// The controller changed state by itself, e.g. the unlock timeout.
    Report(DoorState),
    Emergency,
}

impl Inbound {
    pub fn decode(byte: u8) -> Option<Self> {
        match byte {
            BUTTON_LOCK => Some(Self::Button(DoorState::Closed)),
            BUTTON_PRESENT => Some(Self::Button(DoorState::Present)),
            BUTTON_UNLOCK => Some(Self::Button(DoorState::Open)),
            CMD_LOCK => Some(Self::Report(DoorState::Closed)),
            CMD_PRESENT => Some(Self::Report(DoorState::Present)),
            CMD_UNLOCK => Some(Self::Report(DoorState::Open)),
            EMERGENCY_UNLOCK => Some(Self::Emergency),
            _ => None,
        }
    }
}

/// Byte that commands the controller into `state`.
pub fn command_byte(state: DoorState) -> u8 {
    match state {
        DoorState::Closed => CMD_LOCK,
        DoorState::Present => CMD_PRESENT,
        DoorState::Open => CMD_UNLOCK,
    }
}
