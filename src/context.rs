//! Per-request context.
//!
//! One [`Context`] is created per incoming request, threaded through the
//! dispatch loop, and discarded once the response is flushed. It aggregates
//! the parsed request ([`RequestParts`]), the mutable response state
//! (`status`, `body`, `media_type`, `headers`), the session snapshot, the
//! path parameters captured during matching, and the `finished` flag the
//! static-serving collaborator sets to short-circuit dispatch.
//!
//! Nothing in here is shared across requests.

use serde_json::{Map, Value};

use crate::method::Method;

// ── RequestParts ──────────────────────────────────────────────────────────────

/// The parsed, read-only half of a request.
///
/// The host server fills this in before dispatch: the query string is split
/// and decoded into `query`, the raw body is run through
/// [`body::parse`](crate::body::parse) into `body`, and header names are
/// lowercased. Handlers read it through extractors, never directly off the
/// socket.
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub querystring: String,
    pub query: Map<String, Value>,
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub files: Map<String, Value>,
}

impl RequestParts {
    /// A request with the given method and path and everything else empty.
    /// The host fills the rest; tests usually leave it as-is.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            querystring: String::new(),
            query: Map::new(),
            headers: Vec::new(),
            body: Value::Object(Map::new()),
            files: Map::new(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers as a JSON object. Duplicate names keep the last value.
    pub(crate) fn header_map(&self) -> Map<String, Value> {
        self.headers.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    /// One field of the request view, for the `Request` extractor.
    pub(crate) fn view_key(&self, key: &str) -> Value {
        match key {
            "method"      => Value::String(self.method.as_str().to_owned()),
            "path"        => Value::String(self.path.clone()),
            "querystring" => Value::String(self.querystring.clone()),
            "query"       => Value::Object(self.query.clone()),
            "headers"     => Value::Object(self.header_map()),
            "body"        => self.body.clone(),
            "files"       => Value::Object(self.files.clone()),
            _             => Value::Null,
        }
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// A response body.
///
/// Handlers produce JSON values; the dispatch loop stores them here. `Text`
/// is split out so plain strings render as `text/plain` rather than a quoted
/// JSON string, and `Bytes` carries static-file content untouched.
pub enum Payload {
    Json(Value),
    Text(String),
    Bytes { media_type: String, data: Vec<u8> },
}

impl Payload {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            other            => Self::Json(other),
        }
    }

    /// The payload as a JSON value, for handlers inspecting an earlier
    /// handler's body through the `Response` extractor. Raw bytes have no
    /// JSON form and read as `Null`.
    pub fn as_value(&self) -> Value {
        match self {
            Self::Json(v)       => v.clone(),
            Self::Text(s)       => Value::String(s.clone()),
            Self::Bytes { .. }  => Value::Null,
        }
    }
}

// ── MatchedRoute ──────────────────────────────────────────────────────────────

/// One entry of the match scratch the dispatch loop records per request.
#[derive(Clone, Debug)]
pub struct MatchedRoute {
    pub controller: &'static str,
    pub handler: &'static str,
    pub route_path: String,
}

// ── Context ───────────────────────────────────────────────────────────────────

/// The per-request aggregate handed to [`Registry::dispatch`](crate::Registry::dispatch).
pub struct Context {
    pub request: RequestParts,
    /// Path parameters captured during matching. Later matches overwrite
    /// earlier keys of the same name.
    pub params: Map<String, Value>,
    /// Session data loaded by the host before dispatch, saved after.
    pub session: Map<String, Value>,
    /// Response status. `0` means untouched — the host renders its default.
    pub status: u16,
    /// Response body. Last writer wins across multiple matched handlers.
    pub body: Option<Payload>,
    /// Media-type override, set by a `media_type` hook. Takes precedence
    /// over the payload's own content type when the host renders.
    pub media_type: Option<String>,
    /// Extra response headers.
    pub headers: Vec<(String, String)>,
    /// Set when a collaborator has fully answered the request.
    pub finished: bool,
    /// Match scratch, populated in match order.
    pub matched: Vec<MatchedRoute>,
}

impl Context {
    pub fn new(request: RequestParts) -> Self {
        Self {
            request,
            params: Map::new(),
            session: Map::new(),
            status: 0,
            body: None,
            media_type: None,
            headers: Vec::new(),
            finished: false,
            matched: Vec::new(),
        }
    }

    /// Marks the request fully answered; dispatch skips remaining stages.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// The body assignment the dispatch loop performs for a non-empty
    /// handler result: status 200, body replaced.
    pub fn set_body(&mut self, value: Value) {
        self.status = 200;
        self.body = Some(Payload::from_value(value));
    }

    /// One field of the response view, for the `Response` extractor.
    pub(crate) fn response_view_key(&self, key: &str) -> Value {
        match key {
            "status" if self.status != 0 => Value::from(self.status),
            "status"                     => Value::Null,
            "type"                       => self.media_type.clone().map_or(Value::Null, Value::String),
            "body"                       => self.body.as_ref().map_or(Value::Null, Payload::as_value),
            _                            => Value::Null,
        }
    }
}
