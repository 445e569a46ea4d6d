//! Flow manager: runs many flows at once, addressed by flow id

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use entry_registry::{EntryOptions, RegistrationStore};
use rxv_discovery::{Advertisement, DiscoveryIndex};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::FlowConfig;
use crate::error::{AbortReason, FlowError, Result};
use crate::flow::ReceiverConfigFlow;
use crate::options::OptionsFlow;
use crate::probe::{InputSource, ReceiverProbe};
use crate::result::FlowResult;

/// Result of a step together with the flow it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStep {
    pub flow_id: String,
    pub result: FlowResult,
}

enum ActiveFlow {
    Registration(ReceiverConfigFlow),
    Options { entry_id: String, flow: OptionsFlow },
}

/// Owns in-progress flows between steps.
///
/// Finished flows are dropped right away. A step runs without holding the
/// flow table lock, so one slow probe does not stall other flows; the same
/// flow id must not be configured from two threads at once.
///
/// # Example
///
/// ```rust,ignore
/// let manager = FlowManager::new(probe, index, store);
///
/// let step = manager.init_user();
/// let step = manager.configure(&step.flow_id, &json!({"host": "192.168.1.20"}))?;
/// ```
pub struct FlowManager {
    probe: Arc<dyn ReceiverProbe>,
    index: Arc<dyn DiscoveryIndex>,
    store: Arc<dyn RegistrationStore>,
    config: FlowConfig,
    flows: Mutex<HashMap<String, ActiveFlow>>,
}

impl FlowManager {
    pub fn new(
        probe: Arc<dyn ReceiverProbe>,
        index: Arc<dyn DiscoveryIndex>,
        store: Arc<dyn RegistrationStore>,
    ) -> Self {
        Self {
            probe,
            index,
            store,
            config: FlowConfig::default(),
            flows: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the flow configuration after validating it
    pub fn with_config(mut self, config: FlowConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Start a user-initiated registration flow
    pub fn init_user(&self) -> FlowStep {
        let mut flow = self.registration_flow();
        let result = flow.start_user();
        self.keep(ActiveFlow::Registration(flow), result)
    }

    /// Start a registration flow from a discovery advertisement
    pub fn init_discovery(&self, advertisement: &Advertisement) -> FlowStep {
        let mut flow = self.registration_flow();
        let result = flow.start_discovery(advertisement);
        self.keep(ActiveFlow::Registration(flow), result)
    }

    /// Start the options flow of a registered entry
    pub fn init_options(&self, entry_id: &str, inputs: Arc<dyn InputSource>) -> Result<FlowStep> {
        let entry = self
            .store
            .get(entry_id)
            .ok_or_else(|| FlowError::EntryNotFound(entry_id.to_string()))?;

        let mut flow = OptionsFlow::new(inputs).with_current(entry.options);
        let result = flow.start();
        Ok(self.keep(
            ActiveFlow::Options {
                entry_id: entry_id.to_string(),
                flow,
            },
            result,
        ))
    }

    /// Submit input to a flow.
    ///
    /// A finished options flow has its options persisted to the entry
    /// before the result is returned.
    pub fn configure(&self, flow_id: &str, user_input: &Value) -> Result<FlowStep> {
        let active = self
            .lock_flows()?
            .remove(flow_id)
            .ok_or_else(|| FlowError::FlowNotFound(flow_id.to_string()))?;

        let (active, result) = match active {
            ActiveFlow::Registration(mut flow) => {
                let result = flow.configure(user_input)?;
                (ActiveFlow::Registration(flow), result)
            }
            ActiveFlow::Options { entry_id, mut flow } => {
                let result = flow.configure(user_input)?;
                let result = self.persist_options(&entry_id, result);
                (ActiveFlow::Options { entry_id, flow }, result)
            }
        };

        if result.is_terminal() {
            debug!(flow_id, "flow finished");
            return Ok(FlowStep {
                flow_id: flow_id.to_string(),
                result,
            });
        }

        self.lock_flows()?.insert(flow_id.to_string(), active);
        Ok(FlowStep {
            flow_id: flow_id.to_string(),
            result,
        })
    }

    /// Abandon a flow, discarding its state
    pub fn abort_flow(&self, flow_id: &str) -> Result<()> {
        if self.lock_flows()?.remove(flow_id).is_none() {
            return Err(FlowError::FlowNotFound(flow_id.to_string()));
        }
        debug!(flow_id, "flow abandoned");
        Ok(())
    }

    /// Ids of flows waiting for input
    pub fn in_progress(&self) -> Vec<String> {
        self.flows
            .lock()
            .map(|flows| flows.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn registration_flow(&self) -> ReceiverConfigFlow {
        ReceiverConfigFlow::with_config(
            Arc::clone(&self.probe),
            Arc::clone(&self.index),
            Arc::clone(&self.store),
            self.config.clone(),
        )
    }

    /// Register a flow that still waits for input and wrap its first result
    fn keep(&self, active: ActiveFlow, result: FlowResult) -> FlowStep {
        let flow_id = Uuid::new_v4().to_string();
        if !result.is_terminal() {
            match self.flows.lock() {
                Ok(mut flows) => {
                    flows.insert(flow_id.clone(), active);
                }
                Err(_) => {
                    error!(%flow_id, "flow table poisoned, dropping flow");
                    return FlowStep {
                        flow_id,
                        result: FlowResult::abort(AbortReason::Unknown),
                    };
                }
            }
        }
        FlowStep { flow_id, result }
    }

    fn persist_options(&self, entry_id: &str, result: FlowResult) -> FlowResult {
        let (title, data) = match result {
            FlowResult::CreateEntry { title, data, .. } => (title, data),
            other => return other,
        };

        let stored = serde_json::from_value::<EntryOptions>(data.clone())
            .map_err(|e| e.to_string())
            .and_then(|options| {
                self.store
                    .set_options(entry_id, options)
                    .map_err(|e| e.to_string())
            });

        match stored {
            Ok(entry) => {
                info!(entry_id, "receiver options updated");
                FlowResult::CreateEntry {
                    title,
                    data,
                    entry: Some(entry),
                }
            }
            Err(error) => {
                error!(entry_id, %error, "failed to store options");
                FlowResult::abort(AbortReason::Unknown)
            }
        }
    }

    fn lock_flows(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ActiveFlow>>> {
        self.flows
            .lock()
            .map_err(|_| FlowError::Poisoned)
    }
}

impl std::fmt::Debug for FlowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowManager")
            .field("config", &self.config)
            .field("in_progress", &self.in_progress().len())
            .finish()
    }
}
