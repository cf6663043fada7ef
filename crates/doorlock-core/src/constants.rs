//! Wire-level constants shared with remote clients.
//!
//! The numeric codes in this module are part of the public contract with
//! the mobile apps and scripts that talk to the daemon's API. They are sent
//! as plain integers (`status` and `err` fields of the API response) and
//! must never be renumbered.
//!
//! | Door state | Code |
//! |------------|------|
//! | `Open`     | 0    |
//! | `Present`  | 1    |
//! | `Closed`   | 2    |
//!
//! | Response           | Code |
//! |--------------------|------|
//! | `Success`          | 0    |
//! | `PermissionDenied` | 1    |
//! | `AlreadyActive`    | 2    |
//! | *(reserved)*       | 3    |
//! | `Invalid`          | 4    |
//! | `BackendError`     | 5    |
//! | `InternalError`    | 6    |
//! | `EmergencyUnlock`  | 10   |
//! | `ButtonClose`      | 11   |
//! | `ButtonOpen`       | 12   |
//! | `ButtonPresent`    | 13   |
//!
//! # Protocol Compliance
//!
//! Modifying these values may break protocol compatibility.

// ============================================================================
// Door state codes
// ============================================================================

/// Wire code of [`DoorState::Open`](crate::DoorState::Open).
pub const STATE_CODE_OPEN: u8 = 0;

/// Wire code of [`DoorState::Present`](crate::DoorState::Present).
pub const STATE_CODE_PRESENT: u8 = 1;

/// Wire code of [`DoorState::Closed`](crate::DoorState::Closed).
pub const STATE_CODE_CLOSED: u8 = 2;

// ============================================================================
// Response codes
// ============================================================================

pub const RESPONSE_CODE_SUCCESS: u8 = 0;
pub const RESPONSE_CODE_PERMISSION_DENIED: u8 = 1;
pub const RESPONSE_CODE_ALREADY_ACTIVE: u8 = 2;

/// Formerly `AlreadyOpen`. Old app versions still interpret it, so it is
/// never handed out again.
pub const RESPONSE_CODE_RESERVED: u8 = 3;

pub const RESPONSE_CODE_INVALID: u8 = 4;
pub const RESPONSE_CODE_BACKEND_ERROR: u8 = 5;
pub const RESPONSE_CODE_INTERNAL_ERROR: u8 = 6;

// Unsolicited responses, only ever delivered through the status callback.
pub const RESPONSE_CODE_EMERGENCY_UNLOCK: u8 = 10;
pub const RESPONSE_CODE_BUTTON_CLOSE: u8 = 11;
pub const RESPONSE_CODE_BUTTON_OPEN: u8 = 12;
pub const RESPONSE_CODE_BUTTON_PRESENT: u8 = 13;

// ============================================================================
// Client commands
// ============================================================================

/// API command requesting [`DoorState::Open`](crate::DoorState::Open).
pub const COMMAND_UNLOCK: &str = "unlock";

/// API command requesting [`DoorState::Present`](crate::DoorState::Present).
pub const COMMAND_PRESENT: &str = "present";

/// API command requesting [`DoorState::Closed`](crate::DoorState::Closed).
pub const COMMAND_LOCK: &str = "lock";

/// Directory (relative to the web root) holding the LED images.
pub const LED_IMAGE_DIR: &str = "static";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_code_is_unique() {
        let assigned = [
            RESPONSE_CODE_SUCCESS,
            RESPONSE_CODE_PERMISSION_DENIED,
            RESPONSE_CODE_ALREADY_ACTIVE,
            RESPONSE_CODE_INVALID,
            RESPONSE_CODE_BACKEND_ERROR,
            RESPONSE_CODE_INTERNAL_ERROR,
            RESPONSE_CODE_EMERGENCY_UNLOCK,
            RESPONSE_CODE_BUTTON_CLOSE,
            RESPONSE_CODE_BUTTON_OPEN,
            RESPONSE_CODE_BUTTON_PRESENT,
        ];
        assert!(!assigned.contains(&RESPONSE_CODE_RESERVED));
    }
}
