//! Device-facing contracts of the flows
//!
//! [`ReceiverProbe`] identifies a receiver during registration and
//! [`InputSource`] enumerates inputs for the options flow. Both are
//! implemented for the YNC client types; tests substitute fakes.

use std::collections::BTreeMap;

use rxv_client::{ClientError, ReceiverSession, YncClient};
use thiserror::Error;
use tracing::debug;

/// Identity a receiver reported when probed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverIdentity {
    pub serial: Option<String>,
    pub model: Option<String>,
    /// Whether the remote-control endpoint answered with the receiver's
    /// identity
    pub control_url_reachable: bool,
}

/// Result of probing a host that answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Identified(ReceiverIdentity),
    /// Something answered, but not with the receiver API
    Malformed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// Nothing answered at the transport level
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl From<ClientError> for ProbeError {
    fn from(error: ClientError) -> Self {
        if error.is_connection_failure() {
            ProbeError::Connection(error.to_string())
        } else {
            ProbeError::Unexpected(error.to_string())
        }
    }
}

/// Opens a session with a receiver and reports its identity
pub trait ReceiverProbe: Send + Sync {
    fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// Live input enumeration of a registered receiver
pub trait InputSource: Send + Sync {
    /// Map of input id to its current label, `None` when the receiver has no
    /// name for it
    fn current_inputs(&self) -> Result<BTreeMap<String, Option<String>>, ProbeError>;
}

impl ReceiverProbe for YncClient {
    fn probe(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        let session = match self.connect(host) {
            Ok(session) => session,
            Err(ClientError::Network(message)) => return Err(ProbeError::Connection(message)),
            Err(error) => {
                debug!(host, %error, "host answered without the YNC API");
                return Ok(ProbeOutcome::Malformed);
            }
        };

        // A missing description yields no serial; a failed lookup is an error
        let serial = session.serial_number()?;

        Ok(ProbeOutcome::Identified(ReceiverIdentity {
            serial,
            model: session.model_name().map(str::to_string),
            control_url_reachable: session.system().is_identified(),
        }))
    }
}

impl InputSource for ReceiverSession {
    fn current_inputs(&self) -> Result<BTreeMap<String, Option<String>>, ProbeError> {
        Ok(self.inputs()?)
    }
}
