//! Extractors — how handler parameters and injected properties get their
//! values.
//!
//! An [`Extractor`] is a pure projection over the request [`Context`]: it
//! reads, it never writes. The set is closed — one variant per request-data
//! source — and each variant carries its own payload: a key list for the
//! map-shaped sources, a [`FieldRules`] table for the validating ones.
//! The same value works bound to a parameter index or to an injected
//! property; the registration site decides which.
//!
//! `Body`, `Query`, and `Params` produce [`Validated`] values. Validation
//! failure is not an error — the handler gets the data *and* the failure
//! report, and chooses what to do about it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::context::Context;
use crate::validate::{validate, FieldRules};

// ── Validated ─────────────────────────────────────────────────────────────────

/// Data plus its validation report.
pub struct Validated {
    pub data: Value,
    errors: BTreeMap<String, String>,
}

impl Validated {
    fn clean(data: Value) -> Self {
        Self { data, errors: BTreeMap::new() }
    }

    /// `None` when every rule passed; otherwise the field → message map.
    pub fn error(&self) -> Option<&BTreeMap<String, String>> {
        if self.errors.is_empty() { None } else { Some(&self.errors) }
    }

    /// Convenience field access on the extracted data.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

// ── HandlerArg ────────────────────────────────────────────────────────────────

/// A resolved handler argument.
///
/// `Missing` fills the holes of a parameter vector — an index nothing was
/// bound to resolves to it, and handlers treat it as an absent value.
pub enum HandlerArg {
    Missing,
    Value(Value),
    Validated(Validated),
}

impl HandlerArg {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Validated(v) => Some(&v.data),
            Self::Missing => None,
        }
    }

    pub fn validated(&self) -> Option<&Validated> {
        match self {
            Self::Validated(v) => Some(v),
            _ => None,
        }
    }

    /// Collapses to a plain JSON value; `Missing` becomes `Null`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Missing => Value::Null,
            Self::Value(v) => v,
            Self::Validated(v) => v.data,
        }
    }
}

// ── Extractor ─────────────────────────────────────────────────────────────────

/// The closed set of request-data projections.
///
/// Key-list payloads (`Headers`, `Session`, `Request`, `Response`, `Files`):
/// `None` projects the whole source as an object, `Some(keys)` an object of
/// just those keys (absent keys read as `Null`). Rule payloads (`Body`,
/// `Query`, `Params`): `None` wraps the whole source in a clean
/// [`Validated`], `Some(rules)` narrows to the ruled fields, substitutes
/// defaults, and validates.
pub enum Extractor {
    Headers(Option<Vec<String>>),
    Body(Option<FieldRules>),
    Query(Option<FieldRules>),
    Params(Option<FieldRules>),
    Session(Option<Vec<String>>),
    Request(Option<Vec<String>>),
    Response(Option<Vec<String>>),
    Files(Option<Vec<String>>),
}

impl Extractor {
    /// Resolves this extractor against the current request.
    pub fn extract(&self, ctx: &Context) -> HandlerArg {
        match self {
            Self::Headers(keys) => pick(&ctx.request.header_map(), keys),
            Self::Session(keys) => pick(&ctx.session, keys),
            Self::Files(keys)   => pick(&ctx.request.files, keys),

            Self::Request(keys) => view(keys, REQUEST_KEYS, |k| ctx.request.view_key(k)),
            Self::Response(keys) => view(keys, RESPONSE_KEYS, |k| ctx.response_view_key(k)),

            Self::Body(rules)   => ruled(&ctx.request.body, rules),
            Self::Query(rules)  => ruled(&Value::Object(ctx.request.query.clone()), rules),
            Self::Params(rules) => ruled(&Value::Object(ctx.params.clone()), rules),
        }
    }
}

const REQUEST_KEYS: &[&str] =
    &["method", "path", "querystring", "query", "headers", "body", "files"];
const RESPONSE_KEYS: &[&str] = &["status", "type", "body"];

/// Whole map, or an object of the requested keys.
fn pick(source: &Map<String, Value>, keys: &Option<Vec<String>>) -> HandlerArg {
    let object = match keys {
        None => source.clone(),
        Some(keys) => keys.iter()
            .map(|k| (k.clone(), source.get(k).cloned().unwrap_or(Value::Null)))
            .collect(),
    };
    HandlerArg::Value(Value::Object(object))
}

/// Request/response views assembled field by field.
fn view(
    keys: &Option<Vec<String>>,
    all: &[&str],
    field: impl Fn(&str) -> Value,
) -> HandlerArg {
    let object = match keys {
        None => all.iter().map(|k| ((*k).to_owned(), field(k))).collect(),
        Some(keys) => keys.iter().map(|k| (k.clone(), field(k))).collect(),
    };
    HandlerArg::Value(Value::Object(object))
}

/// Body/Query/Params: narrow to the ruled fields, apply defaults, validate.
fn ruled(source: &Value, rules: &Option<FieldRules>) -> HandlerArg {
    let Some(rules) = rules else {
        return HandlerArg::Validated(Validated::clean(source.clone()));
    };

    let empty = Map::new();
    let source = source.as_object().unwrap_or(&empty);

    let mut data = Map::new();
    for (name, rule) in &rules.0 {
        match source.get(name).filter(|v| !v.is_null()) {
            Some(v) => { data.insert(name.clone(), v.clone()); }
            None => {
                if let Some(default) = &rule.default {
                    data.insert(name.clone(), default.clone());
                }
            }
        }
    }

    let errors = validate(&data, rules);
    HandlerArg::Validated(Validated { data: Value::Object(data), errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestParts;
    use crate::validate::FieldRule;
    use crate::Method;
    use serde_json::json;

    fn ctx() -> Context {
        let mut parts = RequestParts::new(Method::Post, "/users");
        parts.headers = vec![
            ("host".to_owned(), "localhost".to_owned()),
            ("accept".to_owned(), "*/*".to_owned()),
        ];
        parts.body = json!({"name": "alice", "age": 30});
        let mut ctx = Context::new(parts);
        ctx.session.insert("uid".to_owned(), json!(7));
        ctx
    }

    #[test]
    fn headers_picks_requested_keys() {
        let arg = Extractor::Headers(Some(vec!["host".to_owned()])).extract(&ctx());
        assert_eq!(arg.value().unwrap(), &json!({"host": "localhost"}));
    }

    #[test]
    fn headers_without_payload_projects_everything() {
        let arg = Extractor::Headers(None).extract(&ctx());
        assert_eq!(
            arg.value().unwrap(),
            &json!({"host": "localhost", "accept": "*/*"}),
        );
    }

    #[test]
    fn session_absent_key_reads_null() {
        let arg = Extractor::Session(Some(vec!["nope".to_owned()])).extract(&ctx());
        assert_eq!(arg.value().unwrap(), &json!({"nope": null}));
    }

    #[test]
    fn bare_body_is_clean_and_whole() {
        let arg = Extractor::Body(None).extract(&ctx());
        let validated = arg.validated().unwrap();
        assert!(validated.error().is_none());
        assert_eq!(validated.data, json!({"name": "alice", "age": 30}));
    }

    #[test]
    fn ruled_body_narrows_and_validates() {
        let rules = FieldRules::new()
            .field("name", FieldRule::new().required())
            .field("email", FieldRule::new().required());
        let arg = Extractor::Body(Some(rules)).extract(&ctx());
        let validated = arg.validated().unwrap();
        assert_eq!(validated.get("name"), Some(&json!("alice")));
        assert_eq!(validated.get("age"), None);
        let errors = validated.error().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email").unwrap(), "email is required");
    }

    #[test]
    fn ruled_body_substitutes_defaults() {
        let rules = FieldRules::new()
            .field("role", FieldRule::new().default_value("user"));
        let arg = Extractor::Body(Some(rules)).extract(&ctx());
        assert_eq!(arg.validated().unwrap().get("role"), Some(&json!("user")));
    }

    #[test]
    fn request_view_exposes_method_and_path() {
        let arg = Extractor::Request(Some(vec!["method".to_owned(), "path".to_owned()]))
            .extract(&ctx());
        assert_eq!(arg.value().unwrap(), &json!({"method": "POST", "path": "/users"}));
    }

    #[test]
    fn response_view_sees_an_assigned_body() {
        let mut c = ctx();
        c.set_body(json!({"ok": true}));
        let arg = Extractor::Response(None).extract(&c);
        assert_eq!(
            arg.value().unwrap(),
            &json!({"status": 200, "type": null, "body": {"ok": true}}),
        );
    }
}
