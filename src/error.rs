//! Unified error type.
//!
//! Two families share this enum. **Registration errors** (`DuplicateRoute`,
//! `InvalidRoute`, `MissingConstructor`) come out of
//! [`ControllerBuilder::build`](crate::ControllerBuilder::build) — the process
//! is expected not to start with an ambiguous routing table, so callers `?`
//! them straight out of `main`. **Resolution errors** (`ServiceNotFound`,
//! `UnknownHandler`, `Handler`) surface at request time from
//! [`Registry::dispatch`](crate::Registry::dispatch); they fail the current
//! request and nothing else.
//!
//! Field-level validation failures are *not* here — they are ordinary data
//! on [`Validated`](crate::Validated), for the handler to inspect and
//! report.

use thiserror::Error;

use crate::method::Method;

/// The error type returned by decor's fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Two routes on one controller collapsed to the same verb + path.
    #[error("in controller {controller}, handler {handler}(), route path '{path}' repeats for request method {verb}")]
    DuplicateRoute {
        controller: &'static str,
        handler: &'static str,
        verb: Method,
        path: String,
    },

    /// A route pattern that cannot be compiled (e.g. an empty `:` capture).
    #[error("in controller {controller}, handler {handler}(), route path '{path}' is invalid: {reason}")]
    InvalidRoute {
        controller: &'static str,
        handler: &'static str,
        path: String,
        reason: String,
    },

    /// A controller was built without a constructor closure.
    #[error("controller {controller} has no constructor")]
    MissingConstructor { controller: &'static str },

    /// A declared constructor dependency is absent from the service registry.
    #[error("service {name} is not registered")]
    ServiceNotFound { name: &'static str },

    /// A matched handler name the controller's `invoke` does not recognize.
    #[error("controller {controller} has no handler {handler}()")]
    UnknownHandler {
        controller: &'static str,
        handler: String,
    },

    /// A handler body failed; propagates to the host's exception handler.
    #[error("handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an arbitrary handler failure.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }
}
