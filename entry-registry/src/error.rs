//! Error types for the registry

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An entry with this unique id already exists
    #[error("Entry with unique id {0} already exists")]
    Duplicate(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A writer panicked while holding the registry lock
    #[error("Registry lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
