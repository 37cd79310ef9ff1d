//! Route-template compiler and per-route matcher.
//!
//! A route is declared as a base prefix plus a method path, either of which
//! may carry `:name` capture segments. Compilation — concatenate, normalize
//! slashes, tokenize — happens once per controller at build time; request
//! time only walks the pre-split segments. No tree, no backtracking: the
//! dispatch design collects *every* matching route across all controllers,
//! so each compiled route answers independently.
//!
//! Matching is exact per segment. There is no trailing-slash equivalence:
//! `/api/user` does not match a request for `/api/user/`.

use crate::error::Error;

// ── Normalization ─────────────────────────────────────────────────────────────

/// Ensures exactly one leading slash and collapses runs of slashes:
/// `"foo//bar"` → `"/foo/bar"`.
pub(crate) fn normalize_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    out.push('/');
    let mut prev_slash = true;
    for c in raw.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Normalizes a controller base prefix: one leading slash, one trailing
/// slash, no internal runs. `"api"` → `"/api/"`, `"/"` → `"/"`.
pub(crate) fn normalize_base(raw: &str) -> String {
    let mut base = normalize_path(raw);
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

// ── Compiled routes ───────────────────────────────────────────────────────────

enum Segment {
    Literal(String),
    /// Capture slot; its name lives in `CompiledRoute::keys` at the same
    /// capture position.
    Param,
}

/// A route pattern compiled into matchable segments plus capture names.
pub struct CompiledRoute {
    pub(crate) verb: crate::Method,
    /// Full normalized path (base + method path), e.g. `/api/user/:id`.
    pub(crate) route_path: String,
    /// The handler name the route resolves to.
    pub(crate) handler: &'static str,
    segments: Vec<Segment>,
    keys: Vec<String>,
}

/// Compiles `base` + `raw` into a matcher. `controller`/`handler` are only
/// for error messages.
pub(crate) fn compile(
    controller: &'static str,
    handler: &'static str,
    verb: crate::Method,
    base: &str,
    raw: &str,
) -> Result<CompiledRoute, Error> {
    let route_path = normalize_path(&format!("{base}{raw}"));

    let mut segments = Vec::new();
    let mut keys = Vec::new();
    for part in route_path[1..].split('/') {
        match part.strip_prefix(':') {
            Some("") => {
                return Err(Error::InvalidRoute {
                    controller,
                    handler,
                    path: route_path,
                    reason: "capture segment ':' has no name".to_owned(),
                });
            }
            Some(name) => {
                keys.push(name.to_owned());
                segments.push(Segment::Param);
            }
            None => segments.push(Segment::Literal(part.to_owned())),
        }
    }

    Ok(CompiledRoute { verb, route_path, handler, segments, keys })
}

impl CompiledRoute {
    /// Tests `path` against this route. On a match, returns the captured
    /// parameters as `(name, value)` pairs in declaration order.
    pub(crate) fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let rel = path.strip_prefix('/')?;
        let parts: Vec<&str> = rel.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Vec::with_capacity(self.keys.len());
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                // A capture never matches an empty segment.
                Segment::Param if part.is_empty() => return None,
                Segment::Param => captured.push((*part).to_owned()),
            }
        }

        Some(self.keys.iter().cloned().zip(captured).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn route(base: &str, raw: &str) -> CompiledRoute {
        compile("Test", "handler", Method::Get, base, raw).unwrap()
    }

    #[test]
    fn normalization_adds_one_leading_slash_and_collapses_runs() {
        assert_eq!(normalize_path("foo//bar"), "/foo/bar");
        assert_eq!(normalize_path("/foo///bar"), "/foo/bar");
        assert_eq!(normalize_path("user"), "/user");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn base_gets_a_trailing_slash() {
        assert_eq!(normalize_base("/api"), "/api/");
        assert_eq!(normalize_base("api"), "/api/");
        assert_eq!(normalize_base("/"), "/");
    }

    #[test]
    fn base_and_method_path_join_without_doubled_slash() {
        let r = route("/api/", "/user");
        assert_eq!(r.route_path, "/api/user");
        assert!(r.matches("/api/user").is_some());
    }

    #[test]
    fn no_trailing_slash_equivalence() {
        let r = route("/api/", "user");
        assert!(r.matches("/api/user").is_some());
        assert!(r.matches("/api/user/").is_none());
    }

    #[test]
    fn root_route_matches_root_only() {
        let r = route("/", "/");
        assert!(r.matches("/").is_some());
        assert!(r.matches("/x").is_none());
    }

    #[test]
    fn captures_are_named_and_ordered() {
        let r = route("/", "/users/:id/posts/:post");
        let caps = r.matches("/users/42/posts/7").unwrap();
        assert_eq!(caps, vec![
            ("id".to_owned(), "42".to_owned()),
            ("post".to_owned(), "7".to_owned()),
        ]);
    }

    #[test]
    fn capture_refuses_empty_segment() {
        let r = route("/", "/users/:id");
        assert!(r.matches("/users/").is_none());
    }

    #[test]
    fn empty_capture_name_is_a_build_error() {
        let err = compile("Test", "handler", Method::Get, "/", "/users/:").unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }
}
