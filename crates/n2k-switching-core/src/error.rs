//! Error types for the switching bridge.

use thiserror::Error;

/// Result type for switching operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bridging switch state.
///
/// None of these are fatal to the host. Each is confined to the bank or
/// message being serviced when it happened.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected before anything was started.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The host could not subscribe to, or stopped delivering, a bank's paths.
    #[error("Subscription failed for bank {bank}: {message}")]
    Subscription { bank: u8, message: String },

    /// An inbound message did not have the expected shape.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The host refused a state write.
    #[error("Failed to write {path}: {message}")]
    StateWrite { path: String, message: String },

    /// Any other host-side failure.
    #[error("Host error: {0}")]
    Host(String),
}

impl Error {
    /// Create a subscription error for a bank.
    pub fn subscription(bank: u8, message: impl Into<String>) -> Self {
        Self::Subscription {
            bank,
            message: message.into(),
        }
    }

    /// Create a state-write error for a path.
    pub fn state_write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StateWrite {
            path: path.into(),
            message: message.into(),
        }
    }
}
