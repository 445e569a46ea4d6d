//! # Yamaha receiver setup flows
//!
//! Step-based flows that register a Yamaha AV receiver and edit its source
//! options:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use entry_registry::EntryRegistry;
//! use rxv_client::YncClient;
//! use rxv_config_flow::{FlowManager, FlowResult};
//! use rxv_discovery::{DiscoveryConfig, SsdpIndex};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(EntryRegistry::new());
//!     let manager = FlowManager::new(
//!         Arc::new(YncClient::new()),
//!         Arc::new(SsdpIndex::new(DiscoveryConfig::default())?),
//!         registry.clone(),
//!     );
//!
//!     // User flow: host form, then validation
//!     let step = manager.init_user();
//!     let step = manager.configure(&step.flow_id, &json!({"host": "192.168.1.20"}))?;
//!
//!     match step.result {
//!         FlowResult::CreateEntry { title, data, .. } => println!("registered {}: {}", title, data),
//!         FlowResult::Abort { reason } => println!("aborted: {}", reason),
//!         FlowResult::Form { step_id, .. } => println!("more input needed for {}", step_id),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Flows
//!
//! - **User**: `user` form asking for the host, then validation
//! - **Discovery**: classification and validation of an SSDP
//!   advertisement, then a `confirm` form
//! - **Options**: `init` form to ignore inputs and name unnamed ones
//!
//! Validation probes the receiver, picks a UPnP description URL (discovery
//! location, a matching advertisement, or `http://{host}:49154/MediaRenderer/desc.xml`)
//! and refuses devices whose serial is already registered, refreshing the
//! stored host when the device moved.
//!
//! ## Architecture
//!
//! ```text
//! FlowManager (flow ids, persistence of options)
//!     ↓
//! ReceiverConfigFlow / OptionsFlow (steps)
//!     ↓
//! validation::decide (pure duplicate handling)
//!     ↓
//! ReceiverProbe · DiscoveryIndex · RegistrationStore · InputSource
//! ```

pub use config::FlowConfig;
pub use error::{AbortReason, FlowError, Result};
pub use flow::{ReceiverConfigFlow, CONF_HOST, STEP_CONFIRM, STEP_USER};
pub use manager::{FlowManager, FlowStep};
pub use options::{derive_options, InputMap, OptionsFlow, CONF_SOURCE_IGNORE, STEP_INIT};
pub use probe::{InputSource, ProbeError, ProbeOutcome, ReceiverIdentity, ReceiverProbe};
pub use result::{FieldType, FlowResult, FormErrors, FormField};
pub use validation::{decide, Candidate, Decision, DiscoveryHints, HostPatch};

// Re-export the collaborator crates' types used in the flow API
pub use entry_registry::{ConnectionData, EntryOptions, EntrySource, RegistrationEntry, RegistrationStore};
pub use rxv_discovery::{Advertisement, DiscoveryIndex};

mod config;
mod error;
mod flow;
mod manager;
mod options;
mod probe;
mod result;
pub mod logging;
pub mod validation;
