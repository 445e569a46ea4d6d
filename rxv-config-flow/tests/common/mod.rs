//! Fake collaborators for flow tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use entry_registry::{ConnectionData, EntryRegistry, EntrySource, NewEntry, RegistrationEntry, RegistrationStore};
use rxv_config_flow::{
    FlowManager, InputMap, InputSource, ProbeError, ProbeOutcome, ReceiverIdentity, ReceiverProbe,
};
use rxv_discovery::{
    Advertisement, DiscoveryError, DiscoveryIndex, ATTR_UPNP_MODEL_NAME, ATTR_UPNP_SERIAL, HEADER_HOST,
    MEDIA_RENDERER_ST,
};

pub const SERIAL: &str = "1234567890";
pub const MODEL: &str = "MC20";
pub const HOST: &str = "127.0.0.1";

/// Probe answering every host the same way and counting calls
pub struct FakeProbe {
    outcome: Result<ProbeOutcome, ProbeError>,
    calls: AtomicUsize,
}

impl FakeProbe {
    fn with(outcome: Result<ProbeOutcome, ProbeError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn identified(serial: Option<&str>, model: Option<&str>) -> Arc<Self> {
        Self::with(Ok(ProbeOutcome::Identified(ReceiverIdentity {
            serial: serial.map(str::to_string),
            model: model.map(str::to_string),
            control_url_reachable: true,
        })))
    }

    pub fn control_url_unreachable() -> Arc<Self> {
        Self::with(Ok(ProbeOutcome::Identified(ReceiverIdentity {
            serial: Some(SERIAL.to_string()),
            model: Some(MODEL.to_string()),
            control_url_reachable: false,
        })))
    }

    pub fn malformed() -> Arc<Self> {
        Self::with(Ok(ProbeOutcome::Malformed))
    }

    pub fn connection_error() -> Arc<Self> {
        Self::with(Err(ProbeError::Connection("mocked error".to_string())))
    }

    pub fn unexpected_error() -> Arc<Self> {
        Self::with(Err(ProbeError::Unexpected("mocked error".to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReceiverProbe for FakeProbe {
    fn probe(&self, _host: &str) -> Result<ProbeOutcome, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Index with a fixed classification and fixed query answer.
///
/// `advertisements == None` makes every query fail.
pub struct FakeIndex {
    pub is_yamaha: bool,
    pub advertisements: Option<Vec<Advertisement>>,
}

impl FakeIndex {
    pub fn yamaha() -> Arc<Self> {
        Arc::new(Self {
            is_yamaha: true,
            advertisements: Some(Vec::new()),
        })
    }

    pub fn not_yamaha() -> Arc<Self> {
        Arc::new(Self {
            is_yamaha: false,
            advertisements: Some(Vec::new()),
        })
    }

    pub fn with_advertisements(advertisements: Vec<Advertisement>) -> Arc<Self> {
        Arc::new(Self {
            is_yamaha: true,
            advertisements: Some(advertisements),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            is_yamaha: true,
            advertisements: None,
        })
    }
}

impl DiscoveryIndex for FakeIndex {
    fn classify(&self, _advertisement: &Advertisement) -> bool {
        self.is_yamaha
    }

    fn query(&self, search_target: &str) -> rxv_discovery::Result<Vec<Advertisement>> {
        match &self.advertisements {
            Some(advertisements) => Ok(advertisements
                .iter()
                .filter(|a| a.st == search_target)
                .cloned()
                .collect()),
            None => Err(DiscoveryError::Timeout),
        }
    }
}

pub struct FakeInputs(pub Result<InputMap, ProbeError>);

impl FakeInputs {
    /// The inputs of the receiver in the options scenario
    pub fn receiver() -> Arc<Self> {
        Arc::new(Self(Ok(InputMap::from([
            ("Napster".to_string(), Some("Napster".to_string())),
            ("AV1".to_string(), None),
            ("AV2".to_string(), None),
        ]))))
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self(Err(ProbeError::Connection("mocked error".to_string()))))
    }
}

impl InputSource for FakeInputs {
    fn current_inputs(&self) -> Result<InputMap, ProbeError> {
        self.0.clone()
    }
}

/// Media renderer advertisement previously seen for `HOST`, served on port 9000
pub fn renderer_advertisement() -> Advertisement {
    Advertisement::new("mock_usn", MEDIA_RENDERER_ST)
        .with_location("http://127.0.0.1:9000/MediaRenderer/desc.xml")
        .with_header(HEADER_HOST, HOST)
        .with_upnp(ATTR_UPNP_SERIAL, SERIAL)
        .with_upnp(ATTR_UPNP_MODEL_NAME, MODEL)
}

/// Advertisement that starts a discovery flow
pub fn discovery_advertisement(serial: &str) -> Advertisement {
    Advertisement::new("mock_usn", "mock_st")
        .with_location("http://127.0.0.1/desc.xml")
        .with_upnp(ATTR_UPNP_MODEL_NAME, MODEL)
        .with_upnp(ATTR_UPNP_SERIAL, serial)
}

pub fn manager(probe: Arc<FakeProbe>, index: Arc<FakeIndex>, registry: &Arc<EntryRegistry>) -> FlowManager {
    FlowManager::new(probe, index, registry.clone())
}

/// Register the receiver at `host` as if set up earlier
pub fn add_existing(registry: &EntryRegistry, host: &str) -> RegistrationEntry {
    registry
        .create(
            NewEntry::new("Yamaha Receiver", EntrySource::User, ConnectionData::new(host).with_serial(SERIAL))
                .with_model(MODEL),
        )
        .unwrap()
}
