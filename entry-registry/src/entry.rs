//! Registration entry data model

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// How an entry came to be registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    User,
    Ssdp,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::User => "user",
            EntrySource::Ssdp => "ssdp",
        }
    }
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details stored for a receiver.
///
/// Serializes to `{"host": .., "serial": .. | null, "upnp_description": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionData {
    pub host: String,
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upnp_description: Option<String>,
}

impl ConnectionData {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            serial: None,
            upnp_description: None,
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_upnp_description(mut self, url: impl Into<String>) -> Self {
        self.upnp_description = Some(url.into());
        self
    }
}

/// Per-entry source options.
///
/// Ordered collections keep the serialized form stable for identical
/// selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Input ids hidden from source selection
    #[serde(default)]
    pub source_ignore: BTreeSet<String>,
    /// Display names keyed by input id
    #[serde(default)]
    pub source_names: BTreeMap<String, String>,
}

impl EntryOptions {
    pub fn is_empty(&self) -> bool {
        self.source_ignore.is_empty() && self.source_names.is_empty()
    }
}

/// A registered receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    pub entry_id: String,
    /// Device serial; `None` for receivers that do not expose one
    pub unique_id: Option<String>,
    pub title: String,
    pub source: EntrySource,
    pub data: ConnectionData,
    pub model: Option<String>,
    #[serde(default)]
    pub options: EntryOptions,
}

/// Everything needed to create an entry; the registry assigns the entry id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub unique_id: Option<String>,
    pub title: String,
    pub source: EntrySource,
    pub data: ConnectionData,
    pub model: Option<String>,
}

impl NewEntry {
    /// New entry keyed by the connection's serial
    pub fn new(title: impl Into<String>, source: EntrySource, data: ConnectionData) -> Self {
        Self {
            unique_id: data.serial.clone(),
            title: title.into(),
            source,
            data,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub(crate) fn into_entry(self, entry_id: String) -> RegistrationEntry {
        RegistrationEntry {
            entry_id,
            unique_id: self.unique_id,
            title: self.title,
            source: self.source,
            data: self.data,
            model: self.model,
            options: EntryOptions::default(),
        }
    }
}
