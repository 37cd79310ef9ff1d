//! Request-body and query-string parsing.
//!
//! Deliberately tolerant: the dispatch core treats the parsed body as plain
//! data for extractors to project, so a malformed body parses to an empty
//! object rather than failing the request. Multipart is an external
//! collaborator's job — a host that parses uploads puts the results in
//! `RequestParts::files` itself.

use serde_json::{Map, Value};

/// Parses a raw body according to its content type.
///
/// `application/json` parses as-is; `application/x-www-form-urlencoded`
/// decodes into an object of string fields; `text/*` becomes a single
/// `text` field. Anything else — or a parse failure — yields an empty
/// object.
pub fn parse(content_type: Option<&str>, raw: &[u8]) -> Value {
    if raw.is_empty() {
        return Value::Object(Map::new());
    }

    let media = content_type
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim();

    match media {
        "application/json" => {
            serde_json::from_slice(raw).unwrap_or_else(|_| Value::Object(Map::new()))
        }
        "application/x-www-form-urlencoded" => {
            Value::Object(parse_form(std::str::from_utf8(raw).unwrap_or("")))
        }
        t if t.starts_with("text/") => {
            let mut object = Map::new();
            object.insert(
                "text".to_owned(),
                Value::String(String::from_utf8_lossy(raw).into_owned()),
            );
            Value::Object(object)
        }
        _ => Value::Object(Map::new()),
    }
}

/// Decodes a query string (no leading `?`) into an object. Duplicate keys
/// keep the last value.
pub fn parse_query(querystring: &str) -> Map<String, Value> {
    parse_form(querystring)
}

fn parse_form(input: &str) -> Map<String, Value> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(input)
        .map(|pairs| {
            pairs.into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_parses_as_is() {
        let body = parse(Some("application/json"), br#"{"name":"alice"}"#);
        assert_eq!(body, json!({"name": "alice"}));
    }

    #[test]
    fn json_with_charset_parameter_still_parses() {
        let body = parse(Some("application/json; charset=utf-8"), br#"{"n":1}"#);
        assert_eq!(body, json!({"n": 1}));
    }

    #[test]
    fn malformed_json_parses_to_an_empty_object() {
        let body = parse(Some("application/json"), b"{nope");
        assert_eq!(body, json!({}));
    }

    #[test]
    fn form_body_decodes_fields() {
        let body = parse(
            Some("application/x-www-form-urlencoded"),
            b"name=alice&city=a%20b",
        );
        assert_eq!(body, json!({"name": "alice", "city": "a b"}));
    }

    #[test]
    fn text_body_lands_in_a_text_field() {
        let body = parse(Some("text/plain"), b"hello");
        assert_eq!(body, json!({"text": "hello"}));
    }

    #[test]
    fn empty_or_unknown_bodies_are_empty_objects() {
        assert_eq!(parse(None, b""), json!({}));
        assert_eq!(parse(Some("application/octet-stream"), b"\x00\x01"), json!({}));
    }

    #[test]
    fn query_string_duplicates_keep_the_last_value() {
        let query = parse_query("a=1&b=2&a=3");
        assert_eq!(query.get("a"), Some(&json!("3")));
        assert_eq!(query.get("b"), Some(&json!("2")));
    }
}
