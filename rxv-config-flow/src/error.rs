use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason a flow ended without creating an entry.
///
/// Serialized with the codes the frontend translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Host unreachable, or reachable but without the receiver API
    CannotConnect,
    /// Anything unanticipated; the cause is logged
    Unknown,
    /// The device is registered already (possibly after a host refresh)
    AlreadyConfigured,
    /// Discovery data did not describe a controllable receiver
    YxcControlUrlMissing,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::CannotConnect => "cannot_connect",
            AbortReason::Unknown => "unknown",
            AbortReason::AlreadyConfigured => "already_configured",
            AbortReason::YxcControlUrlMissing => "yxc_control_url_missing",
        }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Misuse of the flow API.
///
/// Device and registration failures never surface here; they end the flow
/// with an [`AbortReason`] instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlowError {
    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    #[error("Flow has not been started")]
    NotStarted,

    #[error("Flow already finished")]
    Finished,

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Flow table lock poisoned")]
    Poisoned,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_reason_codes() {
        for reason in [
            AbortReason::CannotConnect,
            AbortReason::Unknown,
            AbortReason::AlreadyConfigured,
            AbortReason::YxcControlUrlMissing,
        ] {
            assert_eq!(
                serde_json::to_value(reason).unwrap(),
                serde_json::Value::String(reason.as_str().to_string())
            );
        }
        assert_eq!(AbortReason::YxcControlUrlMissing.to_string(), "yxc_control_url_missing");
    }
}
