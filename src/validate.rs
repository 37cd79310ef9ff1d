//! Field-level validation rules.
//!
//! Used by the `Body`/`Query`/`Params` extractors: a [`FieldRules`] table
//! declares per-field constraints, [`validate`] reports failures as a
//! field → message map. An empty map means valid. Failures are data, never
//! errors — the handler inspects them via
//! [`Validated::error`](crate::Validated::error) and decides how to respond.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

// ── Rules ─────────────────────────────────────────────────────────────────────

/// Constraints for a single field.
#[derive(Clone, Debug, Default)]
pub struct FieldRule {
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) numeric: bool,
    pub(crate) message: Option<String>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// The field must be present and non-null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Substituted before validation when the field is absent.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// The value must be a number or a string that parses as one.
    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    /// Overrides every generated message for this field.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

/// An ordered table of per-field rules.
///
/// ```rust
/// use decor::{FieldRule, FieldRules};
///
/// let rules = FieldRules::new()
///     .field("name", FieldRule::new().required().min_length(2))
///     .field("age", FieldRule::new().numeric().default_value(0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct FieldRules(pub(crate) Vec<(String, FieldRule)>);

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.0.push((name.into(), rule));
        self
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Checks `data` against `rules`; returns field → human-readable message,
/// empty when everything passes. Only the first failing constraint per field
/// is reported.
pub fn validate(data: &Map<String, Value>, rules: &FieldRules) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    for (name, rule) in &rules.0 {
        let value = data.get(name).filter(|v| !v.is_null());

        let failure = match value {
            None => rule.required.then(|| format!("{name} is required")),
            Some(v) => check_value(name, rule, v),
        };

        if let Some(msg) = failure {
            errors.insert(name.clone(), rule.message.clone().unwrap_or(msg));
        }
    }

    errors
}

fn check_value(name: &str, rule: &FieldRule, value: &Value) -> Option<String> {
    if let Some(min) = rule.min_length {
        if value.as_str().is_some_and(|s| s.chars().count() < min) {
            return Some(format!("{name} must be at least {min} characters"));
        }
    }
    if let Some(max) = rule.max_length {
        if value.as_str().is_some_and(|s| s.chars().count() > max) {
            return Some(format!("{name} must be at most {max} characters"));
        }
    }
    if rule.numeric && !is_numeric(value) {
        return Some(format!("{name} must be numeric"));
    }
    None
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.parse::<f64>().is_ok(),
        _ => false,
    }
}
