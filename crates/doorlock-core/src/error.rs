use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Wire format errors
    #[error("Invalid door state code: {0}")]
    InvalidStateCode(u8),

    #[error("Invalid door command: {0}")]
    InvalidCommand(String),

    #[error("Invalid response code: {0}")]
    InvalidResponseCode(u8),

    #[error("Response code {0} is reserved")]
    ReservedResponseCode(u8),

    // Authentication errors
    #[error("Unknown authentication method: {0}")]
    UnknownAuthMethod(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
