//! Variable trees with deep merge support
//!
//! Package variables (user overrides from the project config, schema
//! defaults from the descriptor) are nested string-keyed maps. They are
//! carried as JSON so a YAML project file and a JSON descriptor share one
//! representation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Variable container with deep merge capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self::from_json_value(value))
    }

    /// Parse values from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self::from_json_value(value))
    }

    /// Wrap a JSON value; `null` becomes an empty tree
    pub fn from_json_value(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::new(),
            other => Self(other),
        }
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g., "db.host")
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Merge with schema defaults applied first
    ///
    /// The merge order is: schema defaults (lowest priority) -> user values.
    /// Defaults only fill in what the user left unset.
    pub fn with_schema_defaults(schema_defaults: Values, user: &Values) -> Self {
        let mut result = schema_defaults;
        result.merge(user);
        result
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    if let JsonValue::Object(map) = value {
        if remaining.is_empty() {
            map.insert((*key).to_string(), new_value);
        } else {
            let entry = map
                .entry((*key).to_string())
                .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
            set_nested(entry, remaining, new_value);
        }
    }
}

fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
db:
  host: localhost
  port: 5432
style: strict
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
db:
  port: 6543
  user: admin
style: relaxed
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("db.host").unwrap(), "localhost");
        assert_eq!(base.get("db.port").unwrap(), 6543);
        assert_eq!(base.get("db.user").unwrap(), "admin");
        assert_eq!(base.get("style").unwrap(), "relaxed");
    }

    #[test]
    fn test_set_nested() {
        let mut values = Values::new();
        values.set("api.token", json!("abc"));
        values.set("retries", json!(3));

        assert_eq!(values.get("api.token").unwrap(), "abc");
        assert_eq!(values.get("retries").unwrap(), 3);
    }

    #[test]
    fn test_set_replaces_scalar_parent() {
        let mut values = Values::from_json(r#"{"api": "flat"}"#).unwrap();
        values.set("api.token", json!("abc"));
        assert_eq!(values.get("api.token").unwrap(), "abc");
    }

    #[test]
    fn test_null_yaml_is_empty() {
        let values = Values::from_yaml("").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_schema_defaults_lose_to_user() {
        let defaults = Values(json!({"lang": "en", "strict": true}));
        let user = Values(json!({"lang": "fr"}));

        let merged = Values::with_schema_defaults(defaults, &user);
        assert_eq!(merged.get("lang").unwrap(), "fr");
        assert_eq!(merged.get("strict").unwrap(), true);
    }
}
