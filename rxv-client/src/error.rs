//! Error types for the YNC client

use thiserror::Error;

/// Errors that can occur while talking to a receiver
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection could not be established or the transfer failed
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The host answered with a non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// XML parsing error or unexpected document shape
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// The receiver answered with a non-zero `RC` attribute
    #[error("Receiver rejected request: RC={0}")]
    Rejected(u16),
}

impl ClientError {
    /// Whether the failure happened before any receiver answered
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}

impl From<ureq::Error> for ClientError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, _) => ClientError::Status(code),
            ureq::Error::Transport(transport) => ClientError::Network(transport.to_string()),
        }
    }
}
