//! Options flow: ignore or rename a registered receiver's inputs

use std::collections::BTreeMap;
use std::sync::Arc;

use entry_registry::EntryOptions;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::{AbortReason, FlowError, Result};
use crate::probe::InputSource;
use crate::result::{FlowResult, FormErrors, FormField};

/// Multi-select field listing the inputs to hide
pub const CONF_SOURCE_IGNORE: &str = "source_ignore";

pub const STEP_INIT: &str = "init";

/// Input id to the label the receiver reports, if any
pub type InputMap = BTreeMap<String, Option<String>>;

/// Build the options record from a form submission.
///
/// `source_ignore` is taken verbatim from the submission; `source_names`
/// holds the non-blank rename fields, which exist only for inputs without
/// a label. Keys that are neither are ignored.
pub fn derive_options(inputs: &InputMap, user_input: &Value) -> std::result::Result<EntryOptions, FormErrors> {
    let invalid = || FormErrors::from([(CONF_SOURCE_IGNORE.to_string(), "invalid_source".to_string())]);

    let mut options = EntryOptions::default();

    match user_input.get(CONF_SOURCE_IGNORE) {
        None | Some(Value::Null) => {}
        Some(Value::Array(selected)) => {
            for id in selected {
                match id.as_str() {
                    Some(id) if inputs.contains_key(id) => {
                        options.source_ignore.insert(id.to_string());
                    }
                    _ => return Err(invalid()),
                }
            }
        }
        Some(_) => return Err(invalid()),
    }

    for id in renameable(inputs) {
        let name = user_input
            .get(id)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = name {
            options.source_names.insert(id.to_string(), name.to_string());
        }
    }

    Ok(options)
}

fn renameable(inputs: &InputMap) -> impl Iterator<Item = &str> {
    inputs
        .iter()
        .filter(|(_, label)| label.is_none())
        .map(|(id, _)| id.as_str())
}

/// Options flow for one registered receiver.
///
/// Yields the options record as `create_entry` data; persisting it is up
/// to the caller.
pub struct OptionsFlow {
    source: Arc<dyn InputSource>,
    current: EntryOptions,
    /// Enumeration the form was built from, `None` before `start`
    inputs: Option<InputMap>,
    finished: bool,
}

impl OptionsFlow {
    pub fn new(source: Arc<dyn InputSource>) -> Self {
        Self {
            source,
            current: EntryOptions::default(),
            inputs: None,
            finished: false,
        }
    }

    /// Prefill the form with the entry's stored options
    pub fn with_current(mut self, current: EntryOptions) -> Self {
        self.current = current;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Enumerate inputs and show the form
    pub fn start(&mut self) -> FlowResult {
        match self.source.current_inputs() {
            Ok(inputs) => {
                debug!(inputs = inputs.len(), "options flow started");
                let form = FlowResult::form(STEP_INIT, self.schema(&inputs));
                self.inputs = Some(inputs);
                form
            }
            Err(error) => {
                warn!(%error, "cannot enumerate receiver inputs");
                self.finished = true;
                FlowResult::abort(AbortReason::CannotConnect)
            }
        }
    }

    /// Submit the form.
    ///
    /// Unknown ignore ids re-show the form with an `invalid_source` error.
    pub fn configure(&mut self, user_input: &Value) -> Result<FlowResult> {
        if self.finished {
            return Err(FlowError::Finished);
        }
        let Some(inputs) = &self.inputs else {
            return Err(FlowError::NotStarted);
        };

        match derive_options(inputs, user_input) {
            Ok(options) => Ok(self.finish(serde_json::to_value(&options))),
            Err(errors) => {
                debug!(?errors, "options rejected");
                Ok(FlowResult::form_with_errors(STEP_INIT, self.schema(inputs), errors))
            }
        }
    }

    fn finish(&mut self, data: serde_json::Result<Value>) -> FlowResult {
        self.finished = true;
        match data {
            Ok(data) => FlowResult::CreateEntry {
                title: String::new(),
                data,
                entry: None,
            },
            Err(error) => {
                error!(%error, "failed to serialize options");
                FlowResult::abort(AbortReason::Unknown)
            }
        }
    }

    fn schema(&self, inputs: &InputMap) -> Vec<FormField> {
        let ignored: Vec<&String> = self
            .current
            .source_ignore
            .iter()
            .filter(|id| inputs.contains_key(id.as_str()))
            .collect();

        let mut schema = vec![FormField::multi_select(
            CONF_SOURCE_IGNORE,
            inputs.keys().cloned().collect(),
        )
        .with_default(json!(ignored))];

        for id in renameable(inputs) {
            let field = FormField::string(id);
            schema.push(match self.current.source_names.get(id) {
                Some(name) => field.with_default(json!(name)),
                None => field,
            });
        }

        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> InputMap {
        InputMap::from([
            ("Napster".to_string(), Some("Napster".to_string())),
            ("AV1".to_string(), None),
            ("AV2".to_string(), None),
        ])
    }

    #[test]
    fn test_derive_options() {
        let options = derive_options(
            &inputs(),
            &json!({"AV1": "Projector", "AV2": "TV", "source_ignore": ["Napster"]}),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({
                "source_ignore": ["Napster"],
                "source_names": {"AV1": "Projector", "AV2": "TV"},
            })
        );
    }

    #[test]
    fn test_blank_and_unknown_names_dropped() {
        let options = derive_options(
            &inputs(),
            &json!({"AV1": "   ", "Napster": "Music", "HDMI9": "Ghost"}),
        )
        .unwrap();

        assert!(options.is_empty());
    }

    #[test]
    fn test_names_trimmed() {
        let options = derive_options(&inputs(), &json!({"AV2": "  TV "})).unwrap();
        assert_eq!(options.source_names["AV2"], "TV");
    }

    #[test]
    fn test_ignored_input_keeps_name() {
        let options = derive_options(&inputs(), &json!({"AV1": "Projector", "source_ignore": ["AV1"]})).unwrap();

        assert!(options.source_ignore.contains("AV1"));
        assert_eq!(options.source_names["AV1"], "Projector");
    }

    struct Fixed(InputMap);

    impl InputSource for Fixed {
        fn current_inputs(&self) -> std::result::Result<InputMap, crate::probe::ProbeError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_unserializable_options_abort_unknown() {
        let mut flow = OptionsFlow::new(Arc::new(Fixed(inputs())));
        flow.start();
        let error = serde_json::from_str::<Value>("{").unwrap_err();

        let result = flow.finish(Err(error));

        assert_eq!(result.abort_reason(), Some(AbortReason::Unknown));
        assert!(flow.is_finished());
        assert_eq!(flow.configure(&json!({})), Err(FlowError::Finished));
    }

    #[test]
    fn test_invalid_ignore_selection() {
        for submitted in [json!({"source_ignore": ["HDMI9"]}), json!({"source_ignore": "Napster"}), json!({"source_ignore": [1]})] {
            let errors = derive_options(&inputs(), &submitted).unwrap_err();
            assert_eq!(errors[CONF_SOURCE_IGNORE], "invalid_source");
        }
    }
}
