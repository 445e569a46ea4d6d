//! A connected receiver handle

use std::collections::BTreeMap;

use crate::{ClientError, SystemConfig, YncClient};

/// Handle to a receiver that answered a `System/Config` query.
///
/// Holds the client it was opened with, so input enumeration uses the
/// same ports and timeouts.
#[derive(Debug, Clone)]
pub struct ReceiverSession {
    client: YncClient,
    host: String,
    system: SystemConfig,
}

impl ReceiverSession {
    pub(crate) fn new(client: YncClient, host: String, system: SystemConfig) -> Self {
        Self { client, host, system }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model_name(&self) -> Option<&str> {
        self.system.model_name.as_deref()
    }

    pub fn system(&self) -> &SystemConfig {
        &self.system
    }

    /// Current input enumeration of the main zone
    pub fn inputs(&self) -> Result<BTreeMap<String, Option<String>>, ClientError> {
        self.client.inputs(&self.host)
    }

    /// Serial number from the UPnP description
    pub fn serial_number(&self) -> Result<Option<String>, ClientError> {
        self.client.serial_number(&self.host)
    }
}
