//! `{{dotted.path}}` / `{{dotted.path:-default}}` substitution
//!
//! The engine is pure: the same content and variable tree always produce
//! the same output. Resolution never fails, a missing path degrades to the
//! declared default or to an empty string.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::values::Values;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\{\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)(?::-([^}]*))?\}\}",
    )
    .expect("placeholder pattern is valid")
});

/// One placeholder occurrence in template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Full token as written, e.g. `{{db.host:-localhost}}`
    pub raw: String,
    /// Dotted variable path, e.g. `db.host`
    pub path: String,
    pub default: Option<String>,
}

/// Parse every placeholder in `content`
///
/// Returns them in order of first occurrence, de-duplicated by raw token.
/// `{{a}}` and `{{a:-x}}` are distinct tokens and both appear.
pub fn parse(content: &str) -> Vec<Placeholder> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for caps in PLACEHOLDER_RE.captures_iter(content) {
        let raw = caps[0].to_string();
        if !seen.insert(raw.clone()) {
            continue;
        }
        out.push(Placeholder {
            raw,
            path: caps[1].to_string(),
            default: caps.get(2).map(|m| m.as_str().to_string()),
        });
    }

    out
}

/// Walk `vars` along a dotted path and render the leaf as text
///
/// Strings are returned as-is, numbers and booleans are formatted. Missing
/// segments, non-object intermediates and non-scalar leaves give "".
pub fn resolve(path: &str, vars: &Values) -> String {
    match vars.get(path) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Substitute every placeholder in `content`
///
/// A repeated token resolves once and every occurrence gets the same text.
/// Substituted values are never re-scanned, so a value that itself looks
/// like `{{x}}` is emitted literally.
pub fn replace(content: &str, vars: &Values) -> String {
    let mut resolved: HashMap<String, String> = HashMap::new();

    PLACEHOLDER_RE
        .replace_all(content, |caps: &Captures<'_>| {
            resolved
                .entry(caps[0].to_string())
                .or_insert_with(|| {
                    let value = resolve(&caps[1], vars);
                    match caps.get(2) {
                        Some(default) if value.is_empty() => default.as_str().to_string(),
                        _ => value,
                    }
                })
                .clone()
        })
        .into_owned()
}

/// Build a nested tree of the declared defaults of `placeholders`
///
/// Placeholders without a default contribute an empty string so the tree
/// lists every variable a template reads.
pub fn default_vars(placeholders: &[Placeholder]) -> Values {
    let mut vars = Values::new();
    for placeholder in placeholders {
        // First declaration wins when the same path appears with different defaults
        if vars.get(&placeholder.path).is_none() {
            let value = placeholder.default.clone().unwrap_or_default();
            vars.set(&placeholder.path, JsonValue::String(value));
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(v: JsonValue) -> Values {
        Values(v)
    }

    #[test]
    fn test_replace_prefers_value_over_default() {
        let out = replace("{{a.b:-x}}", &vars(json!({"a": {"b": "y"}})));
        assert_eq!(out, "y");
    }

    #[test]
    fn test_replace_falls_back_to_default() {
        assert_eq!(replace("{{a.b:-x}}", &Values::new()), "x");
    }

    #[test]
    fn test_replace_missing_without_default_is_empty() {
        assert_eq!(replace("{{a.b}}", &Values::new()), "");
    }

    #[test]
    fn test_replace_empty_default() {
        assert_eq!(replace("[{{a:-}}]", &Values::new()), "[]");
    }

    #[test]
    fn test_replace_embedded_text_and_repeats() {
        let out = replace(
            "host={{db.host}} again={{db.host}} port={{db.port:-5432}}",
            &vars(json!({"db": {"host": "pg"}})),
        );
        assert_eq!(out, "host=pg again=pg port=5432");
    }

    #[test]
    fn test_replace_scalar_types() {
        let v = vars(json!({"n": 3, "f": 1.5, "t": true, "obj": {"k": 1}, "list": [1]}));
        assert_eq!(replace("{{n}}|{{f}}|{{t}}", &v), "3|1.5|true");
        assert_eq!(replace("{{obj:-d}}|{{list}}", &v), "d|");
    }

    #[test]
    fn test_replace_type_mismatch_in_walk() {
        let v = vars(json!({"a": "scalar"}));
        assert_eq!(replace("{{a.b:-fallback}}", &v), "fallback");
    }

    #[test]
    fn test_replace_does_not_expand_values() {
        let v = vars(json!({"a": "{{b}}", "b": "nope"}));
        assert_eq!(replace("{{a}}", &v), "{{b}}");
    }

    #[test]
    fn test_invalid_tokens_left_alone() {
        let text = "{{ spaced }} {{1abc}} {{a..b}} {single}";
        assert_eq!(replace(text, &Values::new()), text);
    }

    #[test]
    fn test_parse_order_and_dedup() {
        let found = parse("{{b}} {{a:-1}} {{b}} {{a}}");
        let raws: Vec<_> = found.iter().map(|p| p.raw.as_str()).collect();
        assert_eq!(raws, vec!["{{b}}", "{{a:-1}}", "{{a}}"]);
        assert_eq!(found[1].path, "a");
        assert_eq!(found[1].default.as_deref(), Some("1"));
        assert_eq!(found[0].default, None);
    }

    #[test]
    fn test_default_vars_nested() {
        let tree = default_vars(&parse("{{db.host:-localhost}} {{db.port:-5432}} {{token}} {{token:-x}}"));
        assert_eq!(
            tree.inner(),
            &json!({"db": {"host": "localhost", "port": "5432"}, "token": ""})
        );
    }

    #[test]
    fn test_replace_is_deterministic() {
        let v = vars(json!({"x": "1"}));
        let text = "{{x}}-{{y:-2}}-{{x}}";
        assert_eq!(replace(text, &v), replace(text, &v));
    }
}
