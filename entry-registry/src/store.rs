//! Registration storage
//!
//! - `RegistrationStore`: the contract the setup flows talk to
//! - `EntryRegistry`: in-memory implementation

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};
use uuid::Uuid;

use crate::entry::{EntryOptions, NewEntry, RegistrationEntry};
use crate::error::{RegistryError, Result};

/// Storage of registration entries, unique by device serial.
///
/// `create` must reject a second entry for a unique id that is already
/// registered, even when two callers race.
pub trait RegistrationStore: Send + Sync {
    /// Entry with the given entry id
    fn get(&self, entry_id: &str) -> Option<RegistrationEntry>;

    /// Entry registered under `unique_id`, if any
    fn find(&self, unique_id: &str) -> Option<RegistrationEntry>;

    /// Register a new entry.
    ///
    /// Fails with `RegistryError::Duplicate` if the unique id is taken.
    fn create(&self, entry: NewEntry) -> Result<RegistrationEntry>;

    /// Refresh host and model of the entry registered under `unique_id`.
    ///
    /// A `None` model keeps the stored one.
    fn update(&self, unique_id: &str, host: &str, model: Option<&str>) -> Result<RegistrationEntry>;

    /// Replace the options of an entry
    fn set_options(&self, entry_id: &str, options: EntryOptions) -> Result<RegistrationEntry>;
}

#[derive(Default)]
struct Entries {
    by_entry_id: HashMap<String, RegistrationEntry>,
    /// unique_id -> entry_id
    by_unique_id: HashMap<String, String>,
}

/// In-memory registry of receiver entries
///
/// Cloning is cheap; clones share the same entries.
///
/// # Example
///
/// ```rust
/// use entry_registry::{ConnectionData, EntryRegistry, EntrySource, NewEntry, RegistrationStore};
///
/// let registry = EntryRegistry::new();
/// let data = ConnectionData::new("192.168.1.20").with_serial("0B123456");
/// registry.create(NewEntry::new("RX-V675", EntrySource::User, data)).unwrap();
///
/// let entry = registry.find("0B123456").unwrap();
/// assert_eq!(entry.data.host, "192.168.1.20");
/// ```
#[derive(Clone)]
pub struct EntryRegistry {
    entries: Arc<RwLock<Entries>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
        }
    }

    /// All entries, in no particular order
    pub fn entries(&self) -> Vec<RegistrationEntry> {
        self.entries
            .read()
            .map(|e| e.by_entry_id.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.by_entry_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove an entry, freeing its unique id
    pub fn remove(&self, entry_id: &str) -> Result<RegistrationEntry> {
        let removed = {
            let mut entries = self.entries.write().map_err(|_| RegistryError::Poisoned)?;
            let removed = entries
                .by_entry_id
                .remove(entry_id)
                .ok_or_else(|| RegistryError::NotFound(entry_id.to_string()))?;
            if let Some(unique_id) = &removed.unique_id {
                entries.by_unique_id.remove(unique_id);
            }
            removed
        };

        debug!(entry_id, "entry removed");
        Ok(removed)
    }
}

impl RegistrationStore for EntryRegistry {
    fn get(&self, entry_id: &str) -> Option<RegistrationEntry> {
        self.entries.read().ok()?.by_entry_id.get(entry_id).cloned()
    }

    fn find(&self, unique_id: &str) -> Option<RegistrationEntry> {
        let entries = self.entries.read().ok()?;
        let entry_id = entries.by_unique_id.get(unique_id)?;
        entries.by_entry_id.get(entry_id).cloned()
    }

    fn create(&self, entry: NewEntry) -> Result<RegistrationEntry> {
        let created = {
            let mut entries = self.entries.write().map_err(|_| RegistryError::Poisoned)?;

            if let Some(unique_id) = &entry.unique_id {
                if entries.by_unique_id.contains_key(unique_id) {
                    return Err(RegistryError::Duplicate(unique_id.clone()));
                }
            }

            let created = entry.into_entry(Uuid::new_v4().to_string());
            if let Some(unique_id) = &created.unique_id {
                entries
                    .by_unique_id
                    .insert(unique_id.clone(), created.entry_id.clone());
            }
            entries
                .by_entry_id
                .insert(created.entry_id.clone(), created.clone());
            created
        };

        info!(entry_id = %created.entry_id, unique_id = ?created.unique_id, title = %created.title, "entry created");
        Ok(created)
    }

    fn update(&self, unique_id: &str, host: &str, model: Option<&str>) -> Result<RegistrationEntry> {
        let updated = {
            let mut entries = self.entries.write().map_err(|_| RegistryError::Poisoned)?;
            let entry_id = entries
                .by_unique_id
                .get(unique_id)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound(unique_id.to_string()))?;
            let entry = entries
                .by_entry_id
                .get_mut(&entry_id)
                .ok_or_else(|| RegistryError::NotFound(entry_id.clone()))?;

            entry.data.host = host.to_string();
            if let Some(model) = model {
                entry.model = Some(model.to_string());
            }
            entry.clone()
        };

        info!(entry_id = %updated.entry_id, unique_id, host, "entry updated");
        Ok(updated)
    }

    fn set_options(&self, entry_id: &str, options: EntryOptions) -> Result<RegistrationEntry> {
        let updated = {
            let mut entries = self.entries.write().map_err(|_| RegistryError::Poisoned)?;
            let entry = entries
                .by_entry_id
                .get_mut(entry_id)
                .ok_or_else(|| RegistryError::NotFound(entry_id.to_string()))?;
            entry.options = options;
            entry.clone()
        };

        debug!(entry_id, "entry options replaced");
        Ok(updated)
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryRegistry")
            .field("entry_count", &self.len())
            .finish()
    }
}
