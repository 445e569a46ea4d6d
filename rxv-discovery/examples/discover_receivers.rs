//! Receiver discovery that outputs JSON for scripting
//!
//! Usage: cargo run -p rxv-setup-discovery --example discover_receivers [timeout_secs]

use std::time::Duration;

use rxv_discovery::{DiscoveryConfig, DiscoveryIndex, SsdpIndex, MEDIA_RENDERER_ST};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let timeout = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let index = SsdpIndex::new(DiscoveryConfig::default().with_timeout(Duration::from_secs(timeout)))?;
    index.scan()?;

    let receivers: Vec<_> = index
        .query(MEDIA_RENDERER_ST)?
        .into_iter()
        .filter(|advertisement| index.classify(advertisement))
        .collect();

    println!("{}", serde_json::to_string_pretty(&receivers)?);
    Ok(())
}
