//! In-memory index of observed advertisements.
//!
//! The index is filled either by [`SsdpIndex::scan`], which sends an
//! M-SEARCH and fetches each responder's description, or by
//! [`SsdpIndex::record`] for advertisements received elsewhere.
//! Classification fetches the advertised description document and looks
//! for the Yamaha remote-control URL.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::device::ReceiverDetails;
use crate::error::{DiscoveryError, Result};
use crate::ssdp::SsdpClient;
use crate::{
    Advertisement, DiscoveryIndex, ATTR_UPNP_FRIENDLY_NAME, ATTR_UPNP_MANUFACTURER,
    ATTR_UPNP_MODEL_NAME, ATTR_UPNP_SERIAL, MEDIA_RENDERER_ST,
};

/// Configuration for [`SsdpIndex`]
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Time to wait for SSDP replies and for each description fetch
    /// Default: 3 seconds
    pub timeout: Duration,

    /// Search target used by `scan()`
    /// Default: the UPnP MediaRenderer device type
    pub search_target: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            search_target: MEDIA_RENDERER_ST.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Discovery index backed by SSDP and HTTP description fetches.
///
/// Cloning is cheap and clones share the same advertisements.
#[derive(Clone)]
pub struct SsdpIndex {
    advertisements: Arc<RwLock<BTreeMap<String, Advertisement>>>,
    http_client: reqwest::blocking::Client,
    config: DiscoveryConfig,
}

impl SsdpIndex {
    /// Create an empty index
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            advertisements: Arc::new(RwLock::new(BTreeMap::new())),
            http_client,
            config,
        })
    }

    /// Record an advertisement, replacing any earlier one with the same USN
    pub fn record(&self, advertisement: Advertisement) {
        if let Ok(mut advertisements) = self.advertisements.write() {
            advertisements.insert(advertisement.usn.clone(), advertisement);
        }
    }

    /// Snapshot of every recorded advertisement
    pub fn advertisements(&self) -> Vec<Advertisement> {
        self.advertisements
            .read()
            .map(|a| a.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of recorded advertisements
    pub fn len(&self) -> usize {
        self.advertisements.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search the network and record every responder.
    ///
    /// Description documents are fetched once per location to fill in the
    /// serial number and model name. Responders whose description cannot
    /// be fetched are still recorded, just without those fields.
    ///
    /// Returns the number of advertisements recorded.
    pub fn scan(&self) -> Result<usize> {
        let client = SsdpClient::new(self.config.timeout)?;
        let mut seen_locations = HashSet::new();
        let mut recorded = 0;

        for reply in client.search(&self.config.search_target)? {
            let (response, sender) = match reply {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "SSDP search ended early");
                    break;
                }
            };

            if !seen_locations.insert(response.location.clone()) {
                continue;
            }

            let mut advertisement = response.into_advertisement(Some(sender));
            if let Some(location) = advertisement.location.clone() {
                match self.fetch_description(&location) {
                    Ok(xml) => fill_upnp_fields(&mut advertisement, &xml),
                    Err(e) => debug!(%location, error = %e, "description unavailable"),
                }
            }

            self.record(advertisement);
            recorded += 1;
        }

        debug!(recorded, "SSDP scan finished");
        Ok(recorded)
    }

    /// Fetch the raw description document at `location`
    pub fn fetch_description(&self, location: &str) -> Result<String> {
        let response = self
            .http_client
            .get(location)
            .send()
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to fetch device description: {}", e)))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::NetworkError(format!(
                "Description request returned {}",
                response.status()
            )));
        }

        response
            .text()
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to read response body: {}", e)))
    }

    /// Fetch and resolve receiver details for an advertisement.
    ///
    /// Returns `Ok(None)` for devices that are not Yamaha receivers.
    pub fn receiver_details(&self, advertisement: &Advertisement) -> Result<Option<ReceiverDetails>> {
        let location = advertisement
            .usable_location()
            .ok_or_else(|| DiscoveryError::InvalidAdvertisement(format!("{} has no location", advertisement.usn)))?;

        let xml = self.fetch_description(location)?;
        ReceiverDetails::from_xml(&xml, location)
    }
}

impl DiscoveryIndex for SsdpIndex {
    fn classify(&self, advertisement: &Advertisement) -> bool {
        match self.receiver_details(advertisement) {
            Ok(Some(details)) => {
                debug!(usn = %advertisement.usn, ctrl_url = %details.ctrl_url, "advertisement is a Yamaha receiver");
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!(usn = %advertisement.usn, error = %e, "could not classify advertisement");
                false
            }
        }
    }

    fn query(&self, search_target: &str) -> Result<Vec<Advertisement>> {
        let advertisements = self
            .advertisements
            .read()
            .map_err(|_| DiscoveryError::NetworkError("advertisement index poisoned".to_string()))?;

        Ok(advertisements
            .values()
            .filter(|a| a.st == search_target)
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for SsdpIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsdpIndex")
            .field("advertisement_count", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

fn fill_upnp_fields(advertisement: &mut Advertisement, xml: &str) {
    let Ok(description) = crate::device::DeviceDescription::from_xml(xml) else {
        return;
    };

    let fields = [
        (ATTR_UPNP_MODEL_NAME, Some(description.model_name)),
        (ATTR_UPNP_MANUFACTURER, Some(description.manufacturer)),
        (ATTR_UPNP_FRIENDLY_NAME, Some(description.friendly_name)),
        (ATTR_UPNP_SERIAL, description.serial_number),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            advertisement.upnp.insert(key.to_string(), value);
        }
    }
}
