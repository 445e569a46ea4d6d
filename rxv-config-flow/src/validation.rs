//! Receiver validation shared by the user and discovery steps
//!
//! Probing and description lookup produce a [`Candidate`]; [`decide`]
//! then settles what to do with it given any existing registration. The
//! flow applies the [`Decision`] to the store.

use entry_registry::{ConnectionData, RegistrationEntry};
use rxv_discovery::DiscoveryIndex;
use tracing::{debug, error, warn};

use crate::config::FlowConfig;
use crate::error::AbortReason;
use crate::probe::{ProbeError, ProbeOutcome, ReceiverProbe};

/// What a discovery advertisement already told us about a receiver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryHints {
    pub serial: Option<String>,
    pub model: Option<String>,
    pub description_url: Option<String>,
}

/// A reachable receiver that is not registered yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub host: String,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub upnp_description: String,
}

impl Candidate {
    /// Connection data stored with the entry
    pub fn connection_data(&self) -> ConnectionData {
        let data = ConnectionData::new(self.host.clone())
            .with_upnp_description(self.upnp_description.clone());
        match &self.serial {
            Some(serial) => data.with_serial(serial.clone()),
            None => data,
        }
    }

    /// Model name, or `default_title` when the model is unknown
    pub fn title(&self, default_title: &str) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(default_title)
            .to_string()
    }
}

/// Refresh applied to an existing entry whose device moved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPatch {
    pub unique_id: String,
    pub host: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Create(Candidate),
    Abort(AbortReason),
    UpdateThenAbort(AbortReason, HostPatch),
}

/// Settle a candidate against the entry registered under its serial.
///
/// Candidates without a serial are never duplicates.
pub fn decide(candidate: Candidate, existing: Option<&RegistrationEntry>) -> Decision {
    let (Some(serial), Some(existing)) = (candidate.serial.as_deref(), existing) else {
        return Decision::Create(candidate);
    };

    if existing.data.host == candidate.host {
        return Decision::Abort(AbortReason::AlreadyConfigured);
    }

    Decision::UpdateThenAbort(
        AbortReason::AlreadyConfigured,
        HostPatch {
            unique_id: serial.to_string(),
            host: candidate.host.clone(),
            model: candidate.model.clone(),
        },
    )
}

/// Probe `host` and build a candidate from the answer and the hints.
///
/// The probe's serial and model win over the hints.
pub fn probe_candidate(
    probe: &dyn ReceiverProbe,
    index: &dyn DiscoveryIndex,
    config: &FlowConfig,
    host: &str,
    hints: &DiscoveryHints,
) -> Result<Candidate, AbortReason> {
    let identity = match probe.probe(host) {
        Ok(ProbeOutcome::Identified(identity)) if identity.control_url_reachable => identity,
        Ok(ProbeOutcome::Identified(_)) => {
            warn!(host, "receiver control URL not reachable");
            return Err(AbortReason::CannotConnect);
        }
        Ok(ProbeOutcome::Malformed) => {
            warn!(host, "host does not expose the receiver API");
            return Err(AbortReason::CannotConnect);
        }
        Err(ProbeError::Connection(message)) => {
            warn!(host, %message, "cannot connect to receiver");
            return Err(AbortReason::CannotConnect);
        }
        Err(ProbeError::Unexpected(message)) => {
            error!(host, %message, "unexpected error while probing receiver");
            return Err(AbortReason::Unknown);
        }
    };

    let upnp_description = match &hints.description_url {
        Some(url) => url.clone(),
        None => resolve_description_url(index, config, host),
    };

    Ok(Candidate {
        host: host.to_string(),
        serial: identity.serial.or_else(|| hints.serial.clone()),
        model: identity.model.or_else(|| hints.model.clone()),
        upnp_description,
    })
}

/// Location of the first advertisement for `host`, else the default URL.
///
/// A failing index query counts as no match.
pub fn resolve_description_url(index: &dyn DiscoveryIndex, config: &FlowConfig, host: &str) -> String {
    let advertisements = index.query(&config.search_target).unwrap_or_else(|error| {
        warn!(host, %error, "discovery query failed");
        Vec::new()
    });

    let matched = advertisements
        .iter()
        .filter(|advertisement| advertisement.host().as_deref() == Some(host))
        .find_map(|advertisement| advertisement.usable_location().map(str::to_string));

    match matched {
        Some(location) => {
            debug!(host, %location, "description URL from discovery");
            location
        }
        None => config.default_description_url(host),
    }
}
