//! Registration flow for a single receiver
//!
//! A flow starts either from the user (a form asking for the host) or from
//! a discovery advertisement (validated up front, then confirmed by the
//! user). Every step returns a [`FlowResult`].

use std::sync::Arc;

use entry_registry::{EntrySource, NewEntry, RegistrationStore, RegistryError};
use rxv_discovery::{Advertisement, DiscoveryIndex};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::FlowConfig;
use crate::error::{AbortReason, FlowError, Result};
use crate::probe::ReceiverProbe;
use crate::result::{FlowResult, FormErrors, FormField};
use crate::validation::{decide, probe_candidate, Candidate, Decision, DiscoveryHints};

/// Form field holding the receiver host
pub const CONF_HOST: &str = "host";

pub const STEP_USER: &str = "user";
pub const STEP_CONFIRM: &str = "confirm";

#[derive(Debug)]
enum FlowState {
    NotStarted,
    AwaitingHost,
    /// Discovered receiver validated, waiting for the user to accept it
    AwaitingConfirm(Candidate),
    Finished,
}

/// Registration flow for one receiver.
///
/// Collaborators are shared handles so many flows can run side by side
/// against the same store.
pub struct ReceiverConfigFlow {
    probe: Arc<dyn ReceiverProbe>,
    index: Arc<dyn DiscoveryIndex>,
    store: Arc<dyn RegistrationStore>,
    config: FlowConfig,
    source: EntrySource,
    state: FlowState,
}

impl ReceiverConfigFlow {
    pub fn new(
        probe: Arc<dyn ReceiverProbe>,
        index: Arc<dyn DiscoveryIndex>,
        store: Arc<dyn RegistrationStore>,
    ) -> Self {
        Self::with_config(probe, index, store, FlowConfig::default())
    }

    pub fn with_config(
        probe: Arc<dyn ReceiverProbe>,
        index: Arc<dyn DiscoveryIndex>,
        store: Arc<dyn RegistrationStore>,
        config: FlowConfig,
    ) -> Self {
        Self {
            probe,
            index,
            store,
            config,
            source: EntrySource::User,
            state: FlowState::NotStarted,
        }
    }

    pub fn source(&self) -> EntrySource {
        self.source
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, FlowState::Finished)
    }

    /// Start from the user: ask for the host
    pub fn start_user(&mut self) -> FlowResult {
        self.source = EntrySource::User;
        self.state = FlowState::AwaitingHost;
        debug!("registration flow started by user");
        self.host_form(None)
    }

    /// Start from a discovery advertisement.
    ///
    /// Advertisements that do not describe a controllable receiver abort
    /// with `yxc_control_url_missing` before any probing.
    pub fn start_discovery(&mut self, advertisement: &Advertisement) -> FlowResult {
        self.source = EntrySource::Ssdp;
        debug!(usn = %advertisement.usn, "registration flow started by discovery");

        if !self.index.classify(advertisement) {
            debug!(usn = %advertisement.usn, "advertisement is not a Yamaha receiver");
            return self.finish(FlowResult::abort(AbortReason::YxcControlUrlMissing));
        }

        let (Some(location), Some(host)) = (advertisement.usable_location(), advertisement.host()) else {
            debug!(usn = %advertisement.usn, "advertisement has no usable location");
            return self.finish(FlowResult::abort(AbortReason::YxcControlUrlMissing));
        };

        let hints = DiscoveryHints {
            serial: advertisement.serial().map(str::to_string),
            model: advertisement.model_name().map(str::to_string),
            description_url: Some(location.to_string()),
        };

        match self.validate(&host, &hints) {
            Ok(candidate) => {
                debug!(host = %candidate.host, serial = ?candidate.serial, "awaiting confirmation");
                self.state = FlowState::AwaitingConfirm(candidate);
                FlowResult::form(STEP_CONFIRM, Vec::new())
            }
            Err(result) => self.finish(result),
        }
    }

    /// Submit input for the current step.
    ///
    /// The confirm step accepts any input, typically `{}`.
    pub fn configure(&mut self, user_input: &Value) -> Result<FlowResult> {
        match std::mem::replace(&mut self.state, FlowState::Finished) {
            FlowState::NotStarted => {
                self.state = FlowState::NotStarted;
                Err(FlowError::NotStarted)
            }
            FlowState::Finished => Err(FlowError::Finished),
            FlowState::AwaitingHost => {
                let host = user_input
                    .get(CONF_HOST)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|host| !host.is_empty());

                let Some(host) = host else {
                    self.state = FlowState::AwaitingHost;
                    let errors = FormErrors::from([(CONF_HOST.to_string(), "required".to_string())]);
                    return Ok(self.host_form(Some(errors)));
                };

                let result = match self.validate(host, &DiscoveryHints::default()) {
                    Ok(candidate) => self.create_entry(candidate),
                    Err(result) => result,
                };
                Ok(self.finish(result))
            }
            FlowState::AwaitingConfirm(candidate) => {
                debug!(host = %candidate.host, "discovered receiver confirmed");
                let result = self.create_entry(candidate);
                Ok(self.finish(result))
            }
        }
    }

    fn host_form(&self, errors: Option<FormErrors>) -> FlowResult {
        let schema = vec![FormField::string(CONF_HOST).required()];
        match errors {
            Some(errors) => FlowResult::form_with_errors(STEP_USER, schema, errors),
            None => FlowResult::form(STEP_USER, schema),
        }
    }

    /// Probe, resolve the description URL and check for an existing entry.
    ///
    /// `Err` carries the abort to surface.
    fn validate(&self, host: &str, hints: &DiscoveryHints) -> std::result::Result<Candidate, FlowResult> {
        let candidate = probe_candidate(
            self.probe.as_ref(),
            self.index.as_ref(),
            &self.config,
            host,
            hints,
        )
        .map_err(FlowResult::abort)?;

        let existing = candidate
            .serial
            .as_deref()
            .and_then(|serial| self.store.find(serial));

        match decide(candidate, existing.as_ref()) {
            Decision::Create(candidate) => Ok(candidate),
            Decision::Abort(reason) => {
                debug!(host, %reason, "receiver already registered at this host");
                Err(FlowResult::abort(reason))
            }
            Decision::UpdateThenAbort(reason, patch) => {
                match self
                    .store
                    .update(&patch.unique_id, &patch.host, patch.model.as_deref())
                {
                    Ok(entry) => info!(
                        entry_id = %entry.entry_id,
                        unique_id = %patch.unique_id,
                        host = %patch.host,
                        "registered receiver moved, host refreshed"
                    ),
                    Err(error) => warn!(unique_id = %patch.unique_id, %error, "failed to refresh host"),
                }
                Err(FlowResult::abort(reason))
            }
        }
    }

    fn create_entry(&self, candidate: Candidate) -> FlowResult {
        let title = candidate.title(&self.config.default_title);
        let connection = candidate.connection_data();

        let data = match serde_json::to_value(&connection) {
            Ok(data) => data,
            Err(error) => {
                error!(%error, "failed to serialize connection data");
                return FlowResult::abort(AbortReason::Unknown);
            }
        };

        let mut new_entry = NewEntry::new(title.clone(), self.source, connection);
        if let Some(model) = candidate.model {
            new_entry = new_entry.with_model(model);
        }

        match self.store.create(new_entry) {
            Ok(entry) => {
                info!(entry_id = %entry.entry_id, host = %entry.data.host, %title, "receiver registered");
                FlowResult::CreateEntry {
                    title,
                    data,
                    entry: Some(entry),
                }
            }
            Err(RegistryError::Duplicate(unique_id)) => {
                debug!(%unique_id, "receiver registered concurrently");
                FlowResult::abort(AbortReason::AlreadyConfigured)
            }
            Err(error) => {
                error!(%error, "failed to store registration");
                FlowResult::abort(AbortReason::Unknown)
            }
        }
    }

    fn finish(&mut self, result: FlowResult) -> FlowResult {
        if result.is_terminal() {
            self.state = FlowState::Finished;
        }
        result
    }
}

impl std::fmt::Debug for ReceiverConfigFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverConfigFlow")
            .field("source", &self.source)
            .field("state", &self.state)
            .finish()
    }
}
