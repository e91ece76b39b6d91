// MIT License - Copyright (c) 2026 Peter Wright
// Error taxonomy for the TPI connection and event pipeline

/// All errors that can occur in the evl-daemon library.
#[derive(Debug, thiserror::Error)]
pub enum TpiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by peer")]
    Disconnected,

    #[error("Invalid checksum on frame: {frame}")]
    ChecksumMismatch { frame: String },

    #[error("Incorrect acknowledgement: expected {expected}, received {received}")]
    AckMismatch { expected: String, received: String },

    #[error("Timeout waiting for acknowledgement of {command}")]
    AckTimeout { command: String },

    #[error("Notifier {name} failed: {details}")]
    Notifier { name: String, details: String },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("Channel closed")]
    ChannelClosed,
}

impl TpiError {
    /// Whether this error ends the connection (or the daemon, for configuration
    /// faults). Everything else is logged and processing continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TpiError::Io(_) | TpiError::Disconnected | TpiError::Config { .. } | TpiError::ChannelClosed
        )
    }

    pub(crate) fn config(details: impl Into<String>) -> Self {
        TpiError::Config {
            details: details.into(),
        }
    }

    pub(crate) fn notifier(name: &str, details: impl std::fmt::Display) -> Self {
        TpiError::Notifier {
            name: name.to_string(),
            details: details.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TpiError>;
