//! Outcomes a flow step hands back to the caller

use std::collections::BTreeMap;

use entry_registry::RegistrationEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AbortReason;

/// Kind of input a form field collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    MultiSelect,
}

/// One field of a form schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Choices of a multi-select field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormField {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            required: false,
            default: None,
            options: Vec::new(),
        }
    }

    pub fn multi_select(name: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::MultiSelect,
            required: false,
            default: None,
            options,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Field name to error code
pub type FormErrors = BTreeMap<String, String>;

/// What a flow step resolved to.
///
/// Serializes as `{"type": "form" | "abort" | "create_entry", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// More input is needed
    Form {
        step_id: String,
        data_schema: Vec<FormField>,
        errors: Option<FormErrors>,
    },
    Abort {
        reason: AbortReason,
    },
    /// The flow finished with `data`.
    ///
    /// `entry` is the stored registration for registration flows and
    /// `None` for options flows, whose data the caller persists.
    CreateEntry {
        title: String,
        data: Value,
        #[serde(skip_serializing)]
        entry: Option<RegistrationEntry>,
    },
}

impl FlowResult {
    pub fn form(step_id: impl Into<String>, data_schema: Vec<FormField>) -> Self {
        FlowResult::Form {
            step_id: step_id.into(),
            data_schema,
            errors: None,
        }
    }

    pub fn form_with_errors(
        step_id: impl Into<String>,
        data_schema: Vec<FormField>,
        errors: FormErrors,
    ) -> Self {
        FlowResult::Form {
            step_id: step_id.into(),
            data_schema,
            errors: Some(errors),
        }
    }

    pub fn abort(reason: AbortReason) -> Self {
        FlowResult::Abort { reason }
    }

    /// Whether no further step follows
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::Form { .. })
    }

    pub fn step_id(&self) -> Option<&str> {
        match self {
            FlowResult::Form { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&FormErrors> {
        match self {
            FlowResult::Form { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            FlowResult::Abort { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Data of a finished flow
    pub fn data(&self) -> Option<&Value> {
        match self {
            FlowResult::CreateEntry { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn entry(&self) -> Option<&RegistrationEntry> {
        match self {
            FlowResult::CreateEntry { entry, .. } => entry.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_json_shape() {
        let result = FlowResult::form("user", vec![FormField::string("host").required()]);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "form",
                "step_id": "user",
                "data_schema": [{"name": "host", "type": "string", "required": true}],
                "errors": null,
            })
        );
        assert!(!result.is_terminal());
    }

    #[test]
    fn test_abort_json_shape() {
        let result = FlowResult::abort(AbortReason::CannotConnect);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"type": "abort", "reason": "cannot_connect"})
        );
        assert_eq!(result.abort_reason(), Some(AbortReason::CannotConnect));
        assert!(result.is_terminal());
    }

    #[test]
    fn test_create_entry_omits_entry() {
        let result = FlowResult::CreateEntry {
            title: String::new(),
            data: json!({"source_ignore": [], "source_names": {}}),
            entry: None,
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "create_entry",
                "title": "",
                "data": {"source_ignore": [], "source_names": {}},
            })
        );
    }

    #[test]
    fn test_multi_select_lists_options() {
        let field = FormField::multi_select("source_ignore", vec!["AV1".to_string()])
            .with_default(json!([]));

        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "name": "source_ignore",
                "type": "multi_select",
                "required": false,
                "default": [],
                "options": ["AV1"],
            })
        );
    }
}
