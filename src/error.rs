//! Error types for waitring.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueueError>;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("queue is at capacity")]
    CapacityExhausted,

    #[error("queue is empty")]
    Empty,

    #[error("operation cancelled while waiting")]
    Interrupted,

    #[error("illegal argument: {message}")]
    IllegalArgument { message: String },

    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },
}

impl QueueError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::IllegalArgument { message: message.into() }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation { message: message.into() }
    }

    /// True if retrying the same operation later could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CapacityExhausted | Self::Empty)
    }
}
