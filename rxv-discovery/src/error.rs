//! Error types for the discovery system.

use std::fmt;

/// Error type for discovery operations.
///
/// Covers socket and HTTP failures while searching, malformed SSDP or
/// description payloads, and advertisements that cannot be used to reach
/// a receiver.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Network-related errors (socket creation, HTTP requests, etc.)
    NetworkError(String),
    /// Parsing errors (XML, SSDP response, etc.)
    ParseError(String),
    /// Operation timed out waiting for responses
    Timeout,
    /// Advertisement lacks data required to address the device
    InvalidAdvertisement(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DiscoveryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DiscoveryError::Timeout => write!(f, "Operation timed out"),
            DiscoveryError::InvalidAdvertisement(msg) => {
                write!(f, "Invalid advertisement: {}", msg)
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
