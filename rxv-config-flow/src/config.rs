//! Configuration for the registration flow

use rxv_client::{url_host, DEFAULT_DESCRIPTION_PORT, DESCRIPTION_PATH};
use rxv_discovery::MEDIA_RENDERER_ST;

use crate::error::FlowError;

/// Configuration for [`ReceiverConfigFlow`](crate::ReceiverConfigFlow)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Search target queried for a description URL when discovery gave none
    /// Default: the UPnP MediaRenderer device type
    pub search_target: String,

    /// Port of the synthesized description URL
    /// Default: 49154
    pub description_port: u16,

    /// Path of the synthesized description URL
    /// Default: "/MediaRenderer/desc.xml"
    pub description_path: String,

    /// Entry title used when the model name is unknown
    /// Default: "Yamaha Receiver"
    pub default_title: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            search_target: MEDIA_RENDERER_ST.to_string(),
            description_port: DEFAULT_DESCRIPTION_PORT,
            description_path: DESCRIPTION_PATH.to_string(),
            default_title: "Yamaha Receiver".to_string(),
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Description URL assumed for `host` when nothing better is known
    pub fn default_description_url(&self, host: &str) -> String {
        format!(
            "http://{}:{}{}",
            url_host(host),
            self.description_port,
            self.description_path
        )
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.search_target.trim().is_empty() {
            return Err(FlowError::Configuration(
                "Search target must not be empty".to_string(),
            ));
        }

        if self.description_port == 0 {
            return Err(FlowError::Configuration(
                "Description port must be greater than 0".to_string(),
            ));
        }

        if !self.description_path.starts_with('/') {
            return Err(FlowError::Configuration(
                "Description path must start with '/'".to_string(),
            ));
        }

        if self.default_title.trim().is_empty() {
            return Err(FlowError::Configuration(
                "Default title must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_search_target(mut self, search_target: impl Into<String>) -> Self {
        self.search_target = search_target.into();
        self
    }

    pub fn with_description_port(mut self, port: u16) -> Self {
        self.description_port = port;
        self
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }
}
