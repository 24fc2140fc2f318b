//! Validation of serialized reports
//!
//! Reads the structured wire form back into the typed model. Every problem
//! is collected with its field path so callers can report all of them at
//! once; nothing is returned unless the whole input is valid.
//!
//! Wire shape:
//!
//! ```text
//! Progress   := { name: string, steps: { <stepName>: Step, ... } | [Step, ...] }
//! Step       := { name: string, completion: Completion, transientData: Transient }
//! Completion := { countTotal?: integer|null, countSuccess: integer, countFailed: integer }
//! Transient  := { successIDs: [string|integer], failedIDs: [string|integer],
//!                 errorsByID?: { <id>: { message: string, code: integer } } }
//! ```

use serde_json::{Map, Value};
use tracing::debug;

use crate::completion::Completion;
use crate::error::{FieldError, ValidationError};
use crate::id::ItemId;
use crate::ordered::OrderedMap;
use crate::progress::Progress;
use crate::step::Step;
use crate::transient::{ErrorDetail, TransientData};

/// Parse and validate a serialized progress report
pub fn parse_progress(value: &Value) -> Result<Progress, ValidationError> {
    let mut validator = Validator::default();
    let progress = validator.progress(value);
    match progress {
        Some(progress) if validator.errors.is_empty() => Ok(progress),
        _ => {
            debug!(errors = validator.errors.len(), "parse_progress: validation failed");
            Err(ValidationError::new(validator.errors))
        }
    }
}

fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Collects field errors while walking the input
#[derive(Debug, Default)]
struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(path, message));
    }

    fn type_error(&mut self, path: &str, label: &str, expected: &str, found: &Value) {
        self.fail(
            path,
            format!("{} is not a valid {} (found {})", label, expected, kind_of(found)),
        );
    }

    fn required<'v>(&mut self, obj: &'v Map<String, Value>, parent: &str, field: &str) -> Option<&'v Value> {
        let value = obj.get(field);
        if value.is_none() {
            self.fail(join(parent, field), format!("{} is required", field));
        }
        value
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str, label: &str) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.type_error(path, label, "object", other);
                None
            }
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &str, field: &str) -> Option<String> {
        match self.required(obj, parent, field)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.type_error(&join(parent, field), field, "string", other);
                None
            }
        }
    }

    fn integer_value(&mut self, value: &Value, path: &str, label: &str) -> Option<i64> {
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.type_error(path, label, "integer", value);
                None
            }
        }
    }

    fn integer(&mut self, obj: &Map<String, Value>, parent: &str, field: &str) -> Option<i64> {
        let value = self.required(obj, parent, field)?;
        self.integer_value(value, &join(parent, field), field)
    }

    /// `Some(None)` when absent or null, `None` when invalid
    fn optional_integer(&mut self, obj: &Map<String, Value>, parent: &str, field: &str) -> Option<Option<i64>> {
        match obj.get(field) {
            None | Some(Value::Null) => Some(None),
            Some(value) => self.integer_value(value, &join(parent, field), field).map(Some),
        }
    }

    fn progress(&mut self, value: &Value) -> Option<Progress> {
        let obj = self.object(value, "", "progress")?;
        let name = self.string(obj, "", "name");
        let steps = self.steps(obj);
        Some(Progress::with_steps(name?, steps?))
    }

    fn steps(&mut self, obj: &Map<String, Value>) -> Option<Vec<(String, Step)>> {
        match self.required(obj, "", "steps")? {
            Value::Object(map) => {
                let mut steps = Vec::with_capacity(map.len());
                let mut valid = true;
                for (key, value) in map {
                    match self.step(value, &join("steps", key), key) {
                        Some(step) => steps.push((key.clone(), step)),
                        None => valid = false,
                    }
                }
                valid.then_some(steps)
            }
            // A list of steps, each keyed by its own name
            Value::Array(items) => {
                let mut steps: Vec<(String, Step)> = Vec::with_capacity(items.len());
                let mut valid = true;
                for (index, value) in items.iter().enumerate() {
                    let path = join("steps", &index.to_string());
                    let Some(step) = self.step(value, &path, &index.to_string()) else {
                        valid = false;
                        continue;
                    };
                    if steps.iter().any(|(name, _)| *name == step.name) {
                        self.fail(join(&path, "name"), format!("duplicate step name {:?}", step.name));
                        valid = false;
                        continue;
                    }
                    steps.push((step.name.clone(), step));
                }
                valid.then_some(steps)
            }
            other => {
                self.type_error("steps", "steps", "object or array", other);
                None
            }
        }
    }

    fn step(&mut self, value: &Value, path: &str, label: &str) -> Option<Step> {
        let obj = self.object(value, path, label)?;
        let name = self.string(obj, path, "name");
        let completion = self
            .required(obj, path, "completion")
            .and_then(|v| self.completion(v, &join(path, "completion")));
        let transient_data = self
            .required(obj, path, "transientData")
            .and_then(|v| self.transient(v, &join(path, "transientData")));
        Some(Step::with_parts(name?, completion?, transient_data?))
    }

    fn completion(&mut self, value: &Value, path: &str) -> Option<Completion> {
        let obj = self.object(value, path, "completion")?;
        let count_total = self.optional_integer(obj, path, "countTotal");
        let count_success = self.integer(obj, path, "countSuccess");
        let count_failed = self.integer(obj, path, "countFailed");
        Some(Completion::new(count_total?, count_success?, count_failed?))
    }

    fn transient(&mut self, value: &Value, path: &str) -> Option<TransientData> {
        let obj = self.object(value, path, "transientData")?;
        let success_ids = self.id_list(obj, path, "successIDs");
        let failed_ids = self.id_list(obj, path, "failedIDs");
        let errors_by_id = self.errors_by_id(obj, path, failed_ids.as_deref().unwrap_or(&[]));
        Some(TransientData::new(success_ids?, failed_ids?, errors_by_id?))
    }

    fn id_list(&mut self, obj: &Map<String, Value>, parent: &str, field: &str) -> Option<Vec<ItemId>> {
        let path = join(parent, field);
        let items = match self.required(obj, parent, field)? {
            Value::Array(items) => items,
            other => {
                self.type_error(&path, field, "array", other);
                return None;
            }
        };

        let mut ids = Vec::with_capacity(items.len());
        let mut valid = true;
        for (index, item) in items.iter().enumerate() {
            match ItemId::from_value(item) {
                Some(id) => ids.push(id),
                None => {
                    let label = format!("{}[{}]", field, index);
                    self.type_error(&join(&path, &index.to_string()), &label, "string or integer", item);
                    valid = false;
                }
            }
        }
        valid.then_some(ids)
    }

    /// Keys are decoded against `failed_ids` so that string ids written as numbers keep their type
    fn errors_by_id(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        failed_ids: &[ItemId],
    ) -> Option<OrderedMap<ItemId, ErrorDetail>> {
        let path = join(parent, "errorsByID");
        let map = match obj.get("errorsByID") {
            None | Some(Value::Null) => return Some(OrderedMap::new()),
            // Writers that cannot tell an empty map from an empty list emit `[]`
            Some(Value::Array(items)) if items.is_empty() => return Some(OrderedMap::new()),
            Some(Value::Object(map)) => map,
            Some(other) => {
                self.type_error(&path, "errorsByID", "object", other);
                return None;
            }
        };

        let mut errors = OrderedMap::new();
        let mut valid = true;
        for (key, value) in map {
            match self.error_detail(value, &join(&path, key), key) {
                Some(detail) => {
                    errors.insert(ItemId::from_key_among(key, failed_ids), detail);
                }
                None => valid = false,
            }
        }
        valid.then_some(errors)
    }

    fn error_detail(&mut self, value: &Value, path: &str, label: &str) -> Option<ErrorDetail> {
        let obj = self.object(value, path, label)?;
        let message = self.string(obj, path, "message");
        let code = self.integer(obj, path, "code");
        Some(ErrorDetail::new(message?, code?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_step() -> Value {
        json!({
            "name": "my step",
            "completion": {"countTotal": 10, "countSuccess": 5, "countFailed": 5},
            "transientData": {
                "successIDs": ["goodID", 3],
                "failedIDs": ["badID"],
                "errorsByID": {"badID": {"message": "Boom!", "code": 500}}
            }
        })
    }

    #[test]
    fn test_parses_valid_report() {
        let progress = parse_progress(&json!({"name": "p", "steps": {"my step": valid_step()}})).unwrap();

        let step = progress.get_step("my step").unwrap();
        assert_eq!(step.completion, Completion::new(Some(10), 5, 5));
        assert_eq!(step.transient_data.success_ids, vec![ItemId::from("goodID"), ItemId::from(3)]);
        assert_eq!(
            step.transient_data.errors_by_id.get(&ItemId::from("badID")),
            Some(&ErrorDetail::new("Boom!", 500))
        );
    }

    #[test]
    fn test_missing_step_parts_reported_by_index() {
        let err = parse_progress(&json!({"name": "My name", "steps": [{"name": "my step"}]})).unwrap_err();

        assert!(err.to_string().contains("steps/0/completion: completion is required"));
        assert!(err.has_path("steps/0/transientData"));
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn test_collects_every_error_in_one_pass() {
        let err = parse_progress(&json!({
            "steps": {
                "a": {
                    "name": 5,
                    "completion": {"countSuccess": "many"},
                    "transientData": {"successIDs": [1, 2.5, null], "failedIDs": {}}
                }
            }
        }))
        .unwrap_err();

        for path in [
            "name",
            "steps/a/name",
            "steps/a/completion/countSuccess",
            "steps/a/completion/countFailed",
            "steps/a/transientData/successIDs/1",
            "steps/a/transientData/successIDs/2",
            "steps/a/transientData/failedIDs",
        ] {
            assert!(err.has_path(path), "missing error for {}: {}", path, err);
        }
    }

    #[test]
    fn test_optional_fields_default() {
        let progress = parse_progress(&json!({
            "name": "p",
            "steps": {
                "s": {
                    "name": "s",
                    "completion": {"countSuccess": 1, "countFailed": 0},
                    "transientData": {"successIDs": [], "failedIDs": []}
                }
            }
        }))
        .unwrap();

        let step = progress.get_step("s").unwrap();
        assert_eq!(step.completion.count_total, None);
        assert!(step.transient_data.errors_by_id.is_empty());
    }

    #[test]
    fn test_null_total_is_accepted() {
        let mut step = valid_step();
        step["completion"]["countTotal"] = Value::Null;
        let progress = parse_progress(&json!({"name": "p", "steps": {"my step": step}})).unwrap();
        assert_eq!(progress.get_step("my step").unwrap().completion.count_total, None);
    }

    #[test]
    fn test_empty_list_accepted_for_empty_maps() {
        let mut step = valid_step();
        step["transientData"]["errorsByID"] = json!([]);
        let progress = parse_progress(&json!({"name": "p", "steps": [step]})).unwrap();
        assert!(progress.get_step("my step").unwrap().transient_data.errors_by_id.is_empty());

        let empty = parse_progress(&json!({"name": "p", "steps": []})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_integer_error_keys_decode_as_int_ids() {
        let mut step = valid_step();
        step["transientData"]["errorsByID"] = json!({"42": {"message": "m", "code": 1}});
        let progress = parse_progress(&json!({"name": "p", "steps": {"my step": step}})).unwrap();

        let errors = &progress.get_step("my step").unwrap().transient_data.errors_by_id;
        assert!(errors.contains_key(&ItemId::Int(42)));
    }

    #[test]
    fn test_numeric_error_key_matching_string_failed_id_stays_string() {
        let mut step = valid_step();
        step["transientData"]["failedIDs"] = json!(["42", 7]);
        step["transientData"]["errorsByID"] = json!({
            "42": {"message": "m", "code": 1},
            "7": {"message": "n", "code": 2}
        });
        let progress = parse_progress(&json!({"name": "p", "steps": {"my step": step}})).unwrap();

        let errors = &progress.get_step("my step").unwrap().transient_data.errors_by_id;
        let keys: Vec<_> = errors.keys().cloned().collect();
        assert_eq!(keys, vec![ItemId::from("42"), ItemId::Int(7)]);
    }

    #[test]
    fn test_invalid_error_detail() {
        let mut step = valid_step();
        step["transientData"]["errorsByID"] = json!({"badID": {"message": 1}});
        let err = parse_progress(&json!({"name": "p", "steps": {"s": step}})).unwrap_err();

        assert!(err.has_path("steps/s/transientData/errorsByID/badID/message"));
        assert!(err.has_path("steps/s/transientData/errorsByID/badID/code"));
    }

    #[test]
    fn test_duplicate_names_in_step_list() {
        let err = parse_progress(&json!({"name": "p", "steps": [valid_step(), valid_step()]})).unwrap_err();
        assert_eq!(err.paths(), vec!["steps/1/name"]);
    }

    #[test]
    fn test_wrong_root_and_steps_types() {
        let err = parse_progress(&json!([1, 2])).unwrap_err();
        assert_eq!(err.paths(), vec![""]);

        let err = parse_progress(&json!({"name": "p", "steps": "nope"})).unwrap_err();
        assert_eq!(err.paths(), vec!["steps"]);
        assert!(err.to_string().contains("steps is not a valid object or array"));
    }
}
