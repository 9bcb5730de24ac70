use thiserror::Error;

/// Shown in the assistant bubble when the chat stream fails
pub const STREAM_ERROR_MESSAGE: &str =
    "Error connecting to the server. Please check your connection and try again.";

/// Shown when an authenticated action runs without a stored token
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Everything that can go wrong on the client side.
///
/// None of these are fatal to a page: each one degrades a single form, bubble or widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Field-level problem; blocks submission only
    #[error("{0}")]
    Validation(String),

    /// Login rejected by the backend
    #[error("{0}")]
    Authentication(String),

    /// No stored token for an authenticated action
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// Network or stream failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Payload could not be decoded
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    /// Local storage of the session token failed
    #[error("session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        ClientError::Decode {
            what,
            reason: err.to_string(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
