//! Action descriptions and canonical fingerprinting
//!
//! An [`Action`] describes one logical API call before batching: the action
//! kind, the resource it targets and its parameter set. Actions compute their
//! own canonical wire form and a deterministic fingerprint which the cache
//! chain uses as its key.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Well-known action kinds understood by the remote API
pub mod kinds {
    pub const READ: &str = "read";
    pub const GET: &str = "get";
    pub const CREATE: &str = "create";
    pub const MODIFY: &str = "modify";
    pub const DELETE: &str = "delete";
    pub const DO: &str = "do";
}

/// Immutable description of one logical API call
///
/// Constructed once per enqueue, never mutated afterwards. The parameter
/// map keeps caller insertion order; only fingerprinting re-sorts keys,
/// and only at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: String,
    resource_type: String,
    resource_id: String,
    identifier: String,
    parameters: Map<String, Value>,
    timestamp: Option<i64>,
}

impl Action {
    /// Create an action with default resource id, identifier and timestamp
    pub fn new(kind: &str, resource_type: &str, parameters: Map<String, Value>) -> Self {
        Self::with_details(kind, resource_type, parameters, "", "", None)
    }

    /// Create an action with every field spelled out
    pub fn with_details(
        kind: &str,
        resource_type: &str,
        parameters: Map<String, Value>,
        resource_id: &str,
        identifier: &str,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            identifier: identifier.to_string(),
            parameters,
            timestamp,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Canonical wire form of this action
    ///
    /// Keys come out in the fixed order `actionid, identifier, parameters,
    /// resourceid, resourcetype, timestamp`. Parameters keep the caller's
    /// insertion order; this is the form used to build wire fragments.
    pub fn canonical_form(&self) -> Value {
        self.build_form(self.parameters.clone())
    }

    /// Deterministic content hash of the canonical form, used as cache key
    ///
    /// The parameter map is re-sorted by key before hashing, top level only,
    /// so two actions that differ solely in parameter key order fingerprint
    /// identically. Nested sequences and mappings keep caller order. The
    /// action itself is not mutated.
    pub fn fingerprint(&self) -> String {
        let sorted = self.build_form(sort_top_level(&self.parameters));
        let mut hasher = Sha256::new();
        hasher.update(sorted.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn build_form(&self, parameters: Map<String, Value>) -> Value {
        let mut form = Map::new();
        form.insert("actionid".to_string(), Value::String(self.kind.clone()));
        form.insert(
            "identifier".to_string(),
            Value::String(self.identifier.clone()),
        );
        form.insert("parameters".to_string(), Value::Object(parameters));
        form.insert(
            "resourceid".to_string(),
            Value::String(self.resource_id.clone()),
        );
        form.insert(
            "resourcetype".to_string(),
            Value::String(self.resource_type.clone()),
        );
        form.insert(
            "timestamp".to_string(),
            self.timestamp.map(Value::from).unwrap_or(Value::Null),
        );
        Value::Object(form)
    }
}

/// Re-sort a parameter map by key, leaving nested values untouched
fn sort_top_level(parameters: &Map<String, Value>) -> Map<String, Value> {
    let mut keys: Vec<&String> = parameters.keys().collect();
    keys.sort();

    let mut sorted = Map::new();
    for key in keys {
        sorted.insert(key.clone(), parameters[key].clone());
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_parameters() -> Map<String, Value> {
        let mut parameters = Map::new();
        parameters.insert("param1".to_string(), json!("value1"));
        parameters.insert(
            "filters".to_string(),
            json!([{ "param2": "value2", "param3": "value3" }, "scalar"]),
        );
        parameters
    }

    #[test]
    fn test_default_canonical_form() {
        let action = Action::new("someId", "someResource", sample_parameters());

        let form = action.canonical_form();
        assert_eq!(form["actionid"], "someId");
        assert_eq!(form["identifier"], "");
        assert_eq!(form["resourceid"], "");
        assert_eq!(form["resourcetype"], "someResource");
        assert_eq!(form["timestamp"], Value::Null);
        assert_eq!(form["parameters"]["param1"], "value1");
        assert_eq!(form["parameters"]["filters"][0]["param2"], "value2");
    }

    #[test]
    fn test_custom_canonical_form() {
        let action = Action::with_details(
            "someId",
            "someResource",
            sample_parameters(),
            "someResourceId",
            "someIdentifier",
            Some(123),
        );

        let form = action.canonical_form();
        assert_eq!(form["identifier"], "someIdentifier");
        assert_eq!(form["resourceid"], "someResourceId");
        assert_eq!(form["timestamp"], 123);
    }

    #[test]
    fn test_canonical_form_keeps_caller_parameter_order() {
        let mut parameters = Map::new();
        parameters.insert("zebra".to_string(), json!(1));
        parameters.insert("alpha".to_string(), json!(2));
        let action = Action::new("read", "contact", parameters);

        let form = action.canonical_form();
        let keys: Vec<&String> = form["parameters"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zebra", "alpha"]);
    }

    #[test]
    fn test_fingerprint_invariant_under_key_order() {
        let mut forward = Map::new();
        forward.insert("a".to_string(), json!(1));
        forward.insert("b".to_string(), json!(2));

        let mut backward = Map::new();
        backward.insert("b".to_string(), json!(2));
        backward.insert("a".to_string(), json!(1));

        let first = Action::new("read", "contact", forward);
        let second = Action::new("read", "contact", backward);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_any_field() {
        let base = Action::new("read", "contact", sample_parameters());
        let other_kind = Action::new("get", "contact", sample_parameters());
        let other_resource = Action::new("read", "estate", sample_parameters());
        let with_id = Action::with_details(
            "read",
            "contact",
            sample_parameters(),
            "17",
            "",
            None,
        );
        let with_timestamp =
            Action::with_details("read", "contact", sample_parameters(), "", "", Some(9));

        assert_ne!(base.fingerprint(), other_kind.fingerprint());
        assert_ne!(base.fingerprint(), other_resource.fingerprint());
        assert_ne!(base.fingerprint(), with_id.fingerprint());
        assert_ne!(base.fingerprint(), with_timestamp.fingerprint());
    }

    #[test]
    fn test_fingerprint_preserves_nested_sequence_order() {
        let mut first = Map::new();
        first.insert("list".to_string(), json!(["a", "b"]));
        let mut second = Map::new();
        second.insert("list".to_string(), json!(["b", "a"]));

        let one = Action::new("read", "contact", first);
        let two = Action::new("read", "contact", second);
        assert_ne!(one.fingerprint(), two.fingerprint());
    }

    #[test]
    fn test_fingerprint_does_not_mutate_parameter_order() {
        let mut parameters = Map::new();
        parameters.insert("zebra".to_string(), json!(1));
        parameters.insert("alpha".to_string(), json!(2));
        let action = Action::new("read", "contact", parameters);

        let _ = action.fingerprint();

        let keys: Vec<&String> = action.parameters().keys().collect();
        assert_eq!(keys, vec!["zebra", "alpha"]);
    }

    #[test]
    fn test_fingerprint_stable_across_calls() {
        let action = Action::new("read", "contact", sample_parameters());
        assert_eq!(action.fingerprint(), action.fingerprint());
    }
}
