//! Yamaha receiver discovery library
//!
//! This crate models SSDP advertisements, answers "which services of this
//! kind have been seen" queries, and decides whether an advertisement
//! belongs to a controllable Yamaha receiver.
//!
//! # Quick Start
//!
//! ```no_run
//! use rxv_discovery::{DiscoveryConfig, DiscoveryIndex, SsdpIndex, MEDIA_RENDERER_ST};
//!
//! let index = SsdpIndex::new(DiscoveryConfig::default()).unwrap();
//! index.scan().unwrap();
//!
//! for advertisement in index.query(MEDIA_RENDERER_ST).unwrap() {
//!     if index.classify(&advertisement) {
//!         println!("Yamaha receiver at {:?}", advertisement.host());
//!     }
//! }
//! ```
//!
//! Callers that already receive advertisements from elsewhere can feed
//! them in with [`SsdpIndex::record`] instead of scanning.

mod error;
mod index;
mod ssdp;
pub mod device;

pub use device::{extract_host_from_url, ReceiverDetails};
pub use error::{DiscoveryError, Result};
pub use index::{DiscoveryConfig, SsdpIndex};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Search target of UPnP media renderers, which every networked receiver exposes.
pub const MEDIA_RENDERER_ST: &str = "urn:schemas-upnp-org:device:MediaRenderer:1";

/// UPnP description field holding the serial number.
pub const ATTR_UPNP_SERIAL: &str = "serialNumber";
/// UPnP description field holding the model name.
pub const ATTR_UPNP_MODEL_NAME: &str = "modelName";
/// UPnP description field holding the manufacturer.
pub const ATTR_UPNP_MANUFACTURER: &str = "manufacturer";
/// UPnP description field holding the friendly name.
pub const ATTR_UPNP_FRIENDLY_NAME: &str = "friendlyName";

/// Header under which the address of the announcing host is recorded.
pub const HEADER_HOST: &str = "_host";

/// A service announcement observed on the network.
///
/// `upnp` holds fields taken from the device description (serial number,
/// model name, ...), `headers` the raw SSDP headers keyed by lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Unique service name, e.g. "uuid:...::urn:schemas-upnp-org:device:MediaRenderer:1"
    pub usn: String,
    /// Search target the announcement answers
    pub st: String,
    /// URL of the description document
    pub location: Option<String>,
    #[serde(default)]
    pub upnp: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Advertisement {
    pub fn new(usn: impl Into<String>, st: impl Into<String>) -> Self {
        Self {
            usn: usn.into(),
            st: st.into(),
            location: None,
            upnp: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_upnp(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.upnp.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn upnp_value(&self, key: &str) -> Option<&str> {
        self.upnp.get(key).map(String::as_str)
    }

    /// Serial number reported in the description, if any
    pub fn serial(&self) -> Option<&str> {
        self.upnp_value(ATTR_UPNP_SERIAL)
    }

    pub fn model_name(&self) -> Option<&str> {
        self.upnp_value(ATTR_UPNP_MODEL_NAME)
    }

    /// Location URL, treating a blank value as missing
    pub fn usable_location(&self) -> Option<&str> {
        self.location.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Host of the announcing device.
    ///
    /// Prefers the resolved `_host` header and falls back to the host part
    /// of the location URL.
    pub fn host(&self) -> Option<String> {
        self.header(HEADER_HOST)
            .map(str::to_string)
            .or_else(|| self.usable_location().and_then(extract_host_from_url))
    }
}

/// Read access to observed advertisements.
///
/// Implementations must be shareable across concurrently running flows.
pub trait DiscoveryIndex: Send + Sync {
    /// Whether the advertisement belongs to a controllable Yamaha receiver
    fn classify(&self, advertisement: &Advertisement) -> bool;

    /// All observed advertisements answering `search_target`, in no particular order
    fn query(&self, search_target: &str) -> Result<Vec<Advertisement>>;
}
