//! Error types shared across the engine.

use std::fmt::{Display, Formatter};

/// Shared engine result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Engine error enumeration covering all failure modes.
///
/// None of these are fatal: every failure degrades to "local state did not
/// update" and is reported to the caller.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Ticket API transport failure or non-success response.
    Api(String),
    /// Payload could not be decoded.
    Decode(String),
    /// Real-time event stream framing failure.
    Feed(String),
    /// Requested ticket does not exist in local state.
    NotFound(String),
    /// Mutation attempted while the selected ticket is read-only.
    ReadOnly(String),
    /// Internal channel closed or full.
    Channel(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Api(msg) => write!(f, "api: {msg}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
            Self::Feed(msg) => write!(f, "feed: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::ReadOnly(msg) => write!(f, "read only: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Api(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
