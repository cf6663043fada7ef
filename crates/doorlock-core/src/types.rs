use crate::{
    Result,
    constants::{
        COMMAND_LOCK, COMMAND_PRESENT, COMMAND_UNLOCK, LED_IMAGE_DIR, RESPONSE_CODE_ALREADY_ACTIVE,
        RESPONSE_CODE_BACKEND_ERROR, RESPONSE_CODE_BUTTON_CLOSE, RESPONSE_CODE_BUTTON_OPEN,
        RESPONSE_CODE_BUTTON_PRESENT, RESPONSE_CODE_EMERGENCY_UNLOCK, RESPONSE_CODE_INTERNAL_ERROR,
        RESPONSE_CODE_INVALID, RESPONSE_CODE_PERMISSION_DENIED, RESPONSE_CODE_RESERVED,
        RESPONSE_CODE_SUCCESS, STATE_CODE_CLOSED, STATE_CODE_OPEN, STATE_CODE_PRESENT,
    },
    error::Error,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical state of the door lock.
///
/// The authoritative value is owned by the door handler and only ever set to
/// something the backend has confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DoorState {
    /// Unlocked, the latch can be opened from outside.
    Open = STATE_CODE_OPEN,
    /// Someone is at the door. Bolt retracted, latch engaged.
    Present = STATE_CODE_PRESENT,
    /// Bolt thrown.
    Closed = STATE_CODE_CLOSED,
}

impl DoorState {
    /// All door states in wire code order.
    pub const ALL: [DoorState; 3] = [DoorState::Open, DoorState::Present, DoorState::Closed];

    /// Create a door state from its wire code.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateCode` for anything other than 0, 1 or 2.
    #[inline]
    pub fn from_wire_code(code: u8) -> Result<Self> {
        match code {
            STATE_CODE_OPEN => Ok(DoorState::Open),
            STATE_CODE_PRESENT => Ok(DoorState::Present),
            STATE_CODE_CLOSED => Ok(DoorState::Closed),
            _ => Err(Error::InvalidStateCode(code)),
        }
    }

    /// Stable wire code used by remote clients.
    #[inline]
    #[must_use]
    pub fn wire_code(self) -> u8 {
        self as u8
    }

    /// Parse an API command (`unlock`, `present`, `lock`).
    ///
    /// # Errors
    /// Returns `Error::InvalidCommand` for any other string.
    pub fn from_command(command: &str) -> Result<Self> {
        match command {
            COMMAND_UNLOCK => Ok(DoorState::Open),
            COMMAND_PRESENT => Ok(DoorState::Present),
            COMMAND_LOCK => Ok(DoorState::Closed),
            _ => Err(Error::InvalidCommand(command.to_string())),
        }
    }

    /// API command that requests this state.
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            DoorState::Open => COMMAND_UNLOCK,
            DoorState::Present => COMMAND_PRESENT,
            DoorState::Closed => COMMAND_LOCK,
        }
    }

    /// Label shown on the web UI and the door display.
    #[must_use]
    pub fn display_label(self) -> &'static str {
        match self {
            DoorState::Open => "Offen",
            DoorState::Present => "Jemand da",
            DoorState::Closed => "Geschlossen",
        }
    }

    /// Status LED color for this state.
    #[must_use]
    pub fn led_color(self) -> LedColor {
        match self {
            DoorState::Open => LedColor::Green,
            DoorState::Present => LedColor::Yellow,
            DoorState::Closed => LedColor::Red,
        }
    }

    /// Path of the LED image rendered by the web UI, e.g. `static/led-red.png`.
    #[must_use]
    pub fn led_image(self) -> String {
        format!("{LED_IMAGE_DIR}/led-{}.png", self.led_color())
    }

    /// Returns `true` unless the door is closed.
    ///
    /// Older app versions only understand a boolean `open` flag, and for
    /// them `Present` counts as open.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, DoorState::Closed)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

impl std::str::FromStr for DoorState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DoorState::from_command(s)
    }
}

/// Colors of the three-LED status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    Red,
    Yellow,
    Green,
}

impl LedColor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LedColor::Red => "red",
            LedColor::Yellow => "yellow",
            LedColor::Green => "green",
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// copied from sudo
const INSULTS: &[&str] = &[
    "Wrong!  You cheating scum!",
    "And you call yourself a Rocket Scientist!",
    "No soap, honkie-lips.",
    "Where did you learn to type?",
    "Are you on drugs?",
    "My pet ferret can type better than you!",
    "You type like i drive.",
    "Do you think like you type?",
    "Your mind just hasn't been the same since the electro-shock, has it?",
    "Maybe if you used more than just two fingers...",
    "BOB says:  You seem to have forgotten your passwd, enter another!",
    "stty: unknown mode: doofus",
    "I can't hear you -- I'm using the scrambler.",
    "The more you drive -- the dumber you get.",
    "Listen, broccoli brains, I don't have time to listen to this trash.",
    "I've seen penguins that can type better than that.",
    "Have you considered trying to match wits with a rutabaga?",
    "You speak an infinite deal of nothing",
];

/// Pick a random insult for a failed authentication.
#[must_use]
pub fn choose_insult() -> &'static str {
    INSULTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Permission denied")
}

/// Outcome of a request, or an unsolicited event from the door.
///
/// The first group is returned synchronously to the caller of a request.
/// The second group (`EmergencyUnlock` and the `Button*` variants) is only
/// ever delivered through the status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Response {
    Success = RESPONSE_CODE_SUCCESS,
    PermissionDenied = RESPONSE_CODE_PERMISSION_DENIED,
    /// The requested state is already active. Nothing was done.
    AlreadyActive = RESPONSE_CODE_ALREADY_ACTIVE,
    /// Malformed request, or a state the backend cannot actuate.
    Invalid = RESPONSE_CODE_INVALID,
    /// The backend rejected the command or failed to confirm it.
    BackendError = RESPONSE_CODE_BACKEND_ERROR,
    /// Misconfigured or unreachable authentication backend.
    InternalError = RESPONSE_CODE_INTERNAL_ERROR,

    EmergencyUnlock = RESPONSE_CODE_EMERGENCY_UNLOCK,
    ButtonClose = RESPONSE_CODE_BUTTON_CLOSE,
    ButtonOpen = RESPONSE_CODE_BUTTON_OPEN,
    ButtonPresent = RESPONSE_CODE_BUTTON_PRESENT,
}

impl Response {
    /// Create a response from its wire code.
    ///
    /// # Errors
    /// Returns `Error::ReservedResponseCode` for code 3 and
    /// `Error::InvalidResponseCode` for unassigned codes.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            RESPONSE_CODE_SUCCESS => Ok(Response::Success),
            RESPONSE_CODE_PERMISSION_DENIED => Ok(Response::PermissionDenied),
            RESPONSE_CODE_ALREADY_ACTIVE => Ok(Response::AlreadyActive),
            RESPONSE_CODE_RESERVED => Err(Error::ReservedResponseCode(code)),
            RESPONSE_CODE_INVALID => Ok(Response::Invalid),
            RESPONSE_CODE_BACKEND_ERROR => Ok(Response::BackendError),
            RESPONSE_CODE_INTERNAL_ERROR => Ok(Response::InternalError),
            RESPONSE_CODE_EMERGENCY_UNLOCK => Ok(Response::EmergencyUnlock),
            RESPONSE_CODE_BUTTON_CLOSE => Ok(Response::ButtonClose),
            RESPONSE_CODE_BUTTON_OPEN => Ok(Response::ButtonOpen),
            RESPONSE_CODE_BUTTON_PRESENT => Ok(Response::ButtonPresent),
            _ => Err(Error::InvalidResponseCode(code)),
        }
    }

    /// Stable wire code used by remote clients.
    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The notification sent when the door reaches `state` without being
    /// asked to (button press, controller timeout, bridge poll).
    #[must_use]
    pub fn unsolicited_for(state: DoorState) -> Self {
        match state {
            DoorState::Open => Response::ButtonOpen,
            DoorState::Present => Response::ButtonPresent,
            DoorState::Closed => Response::ButtonClose,
        }
    }

    /// Returns `true` for responses that only travel the notification path.
    #[inline]
    #[must_use]
    pub fn is_unsolicited(self) -> bool {
        matches!(
            self,
            Response::EmergencyUnlock
                | Response::ButtonClose
                | Response::ButtonOpen
                | Response::ButtonPresent
        )
    }

    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Response::Success)
    }

    /// User-facing message for this response.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Response::Success => "Yo, passt.",
            Response::PermissionDenied => choose_insult(),
            Response::AlreadyActive => "Zustand bereits aktiv",
            Response::Invalid => "Das was du willst geht nicht.",
            Response::BackendError => "Backend Error",
            Response::InternalError => "Moep! Geh LDAP fixen!",
            Response::EmergencyUnlock => "!!! Emergency Unlock !!!",
            Response::ButtonClose => "Closed by button",
            Response::ButtonOpen => "Opened by button",
            Response::ButtonPresent => "Present by button",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Authentication backend selected by a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Username and password checked by an LDAP simple bind.
    LdapUserPw,
    /// Username and password checked against the local salted-hash table.
    LocalUserDb,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthMethod::LdapUserPw => write!(f, "LDAP"),
            AuthMethod::LocalUserDb => write!(f, "Local"),
        }
    }
}

impl std::str::FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ldap" | "ldap_user_pw" => Ok(AuthMethod::LdapUserPw),
            "local" | "local_user_db" => Ok(AuthMethod::LocalUserDb),
            _ => Err(Error::UnknownAuthMethod(s.to_string())),
        }
    }
}

/// `(method, username, secret)` as submitted by a client.
///
/// The secret is never printed: `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    method: AuthMethod,
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(method: AuthMethod, username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            method,
            username: username.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn method(&self) -> AuthMethod {
        self.method
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("method", &self.method)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
