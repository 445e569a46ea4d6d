//! Register receivers from the command line
//!
//! Usage:
//!   cargo run -p rxv-setup-config-flow --example setup_receiver            # SSDP scan
//!   cargo run -p rxv-setup-config-flow --example setup_receiver -- <host>  # manual host
//!
//! Set `RXV_LOG_MODE=development` to see what the flows decide.

use std::sync::Arc;

use entry_registry::EntryRegistry;
use rxv_client::YncClient;
use rxv_config_flow::logging::init_logging_from_env;
use rxv_config_flow::{FlowManager, FlowResult};
use rxv_discovery::{DiscoveryConfig, DiscoveryIndex, SsdpIndex, MEDIA_RENDERER_ST};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let client = YncClient::new();
    let index = Arc::new(SsdpIndex::new(DiscoveryConfig::default())?);
    let registry = Arc::new(EntryRegistry::new());
    let manager = FlowManager::new(Arc::new(client.clone()), index.clone(), registry.clone());

    match std::env::args().nth(1) {
        Some(host) => {
            let step = manager.init_user();
            let step = manager.configure(&step.flow_id, &json!({ "host": host }))?;
            report(&step.result);
        }
        None => {
            index.scan()?;
            for advertisement in index.query(MEDIA_RENDERER_ST)? {
                let step = manager.init_discovery(&advertisement);
                if step.result.is_terminal() {
                    report(&step.result);
                    continue;
                }
                println!("Found receiver at {:?}, confirming", advertisement.host());
                let step = manager.configure(&step.flow_id, &json!({}))?;
                report(&step.result);
            }
        }
    }

    // Show the options form of every registered receiver
    for entry in registry.entries() {
        let session = match client.connect(&entry.data.host) {
            Ok(session) => session,
            Err(e) => {
                println!("{}: {}", entry.title, e);
                continue;
            }
        };
        let step = manager.init_options(&entry.entry_id, Arc::new(session))?;
        println!("{}", serde_json::to_string_pretty(&step.result)?);
        manager.abort_flow(&step.flow_id).ok();
    }

    Ok(())
}

fn report(result: &FlowResult) {
    match result {
        FlowResult::CreateEntry { title, data, .. } => println!("Registered {}: {}", title, data),
        FlowResult::Abort { reason } => println!("Aborted: {}", reason),
        FlowResult::Form { step_id, .. } => println!("Waiting for input on step {}", step_id),
    }
}
