//! Receiver registration registry
//!
//! Stores one registration entry per device, keyed by the device serial
//! (the entry's `unique_id`).
//!
//! # Features
//!
//! - **Unique by serial**: concurrent creates for one serial cannot both succeed
//! - **Host refresh**: update host and model in place when a device moves
//! - **Options**: per-entry source ignore/rename settings
//! - **Shared**: clones see the same entries from any thread
//!
//! # Quick Start
//!
//! ```rust
//! use entry_registry::{
//!     ConnectionData, EntryRegistry, EntrySource, NewEntry, RegistrationStore, RegistryError,
//! };
//!
//! let registry = EntryRegistry::new();
//! let data = ConnectionData::new("192.168.1.20")
//!     .with_serial("0B123456")
//!     .with_upnp_description("http://192.168.1.20:49154/MediaRenderer/desc.xml");
//!
//! let entry = registry
//!     .create(NewEntry::new("RX-V675", EntrySource::User, data.clone()))
//!     .unwrap();
//! assert_eq!(entry.unique_id.as_deref(), Some("0B123456"));
//!
//! // A second registration of the same receiver is refused
//! let again = registry.create(NewEntry::new("RX-V675", EntrySource::Ssdp, data));
//! assert!(matches!(again, Err(RegistryError::Duplicate(_))));
//! ```

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{ConnectionData, EntryOptions, EntrySource, NewEntry, RegistrationEntry};
pub use error::{RegistryError, Result};
pub use store::{EntryRegistry, RegistrationStore};
