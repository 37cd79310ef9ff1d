//! Controller metadata: the builder, the sealed definition, and the trait
//! controllers implement.
//!
//! # How controller metadata is accumulated
//!
//! Every declarative fact about a controller — its base route, which verbs
//! and paths reach which handlers, what each handler parameter is populated
//! from, which properties get injected, which services the constructor
//! needs — is registered on a [`ControllerBuilder`] and sealed by
//! [`build`](ControllerBuilder::build) into an immutable [`ControllerDef`].
//! Build time is where integrity is enforced: paths are normalized, a
//! duplicate verb + path pair on one controller is a fatal
//! [`Error::DuplicateRoute`], and every route is compiled into its matcher
//! exactly once. After `build`, nothing mutates the definition; the dispatch
//! loop only reads it.
//!
//! Two merge disciplines coexist on purpose and must not be conflated:
//! properties and hooks **overwrite by key** (registering twice replaces),
//! while parameters **append at a fixed index** (binding index 2 never
//! disturbs indices 0, 1, or 3 — unbound indices stay holes and resolve to
//! [`HandlerArg::Missing`]).
//!
//! # How handlers are reached
//!
//! There is no reflection. A controller implements [`Controller::invoke`],
//! dispatching on the handler name it was registered under — one `match`,
//! one boxed future per call, the same type-erasure cost as any dynamic
//! handler table:
//!
//! ```rust
//! use decor::{BoxFuture, Context, Controller, Error, HandlerArg};
//! use serde_json::{json, Value};
//!
//! struct UserController;
//!
//! impl Controller for UserController {
//!     fn invoke<'a>(
//!         &'a mut self,
//!         handler: &'a str,
//!         _ctx: &'a mut Context,
//!         args: Vec<HandlerArg>,
//!     ) -> BoxFuture<'a, Result<Option<Value>, Error>> {
//!         Box::pin(async move {
//!             match handler {
//!                 "detail" => {
//!                     let params = args.first().and_then(HandlerArg::value);
//!                     Ok(Some(json!({ "params": params })))
//!                 }
//!                 _ => Err(Error::UnknownHandler {
//!                     controller: "UserController",
//!                     handler: handler.to_owned(),
//!                 }),
//!             }
//!         })
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::Error;
use crate::extract::{Extractor, HandlerArg};
use crate::method::Method;
use crate::router::{compile, normalize_base, normalize_path, CompiledRoute};
use crate::service::{ServiceDep, Services};

/// A heap-allocated, type-erased future.
///
/// `Pin<Box<…>>` because the runtime polls futures in place; the `'a`
/// lifetime lets `invoke` borrow both the controller instance and the
/// context across its await points.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ── Controller trait ──────────────────────────────────────────────────────────

/// Implemented by every routable controller.
///
/// One instance is constructed per request per matched controller — never
/// pooled, never shared — so `invoke` takes `&mut self` without ceremony.
///
/// `invoke` receives the handler name a route resolved to and the arguments
/// the extractors produced, in parameter order. Return `Ok(Some(value))` to
/// assign the response body (empty values — `Null`, `""` — leave it
/// untouched), `Ok(None)` to produce nothing, or an unrecognized-name error
/// via [`Error::UnknownHandler`].
pub trait Controller: Send + 'static {
    fn invoke<'a>(
        &'a mut self,
        handler: &'a str,
        ctx: &'a mut Context,
        args: Vec<HandlerArg>,
    ) -> BoxFuture<'a, Result<Option<Value>, Error>>;

    /// Receives property-injection values right after construction, before
    /// any handler runs. Controllers without injected properties keep the
    /// default no-op.
    fn assign(&mut self, _property: &str, _value: HandlerArg) {}
}

/// Constructs one controller instance from the service registry.
pub type ConstructorFn =
    Arc<dyn Fn(&Services) -> Result<Box<dyn Controller>, Error> + Send + Sync>;

/// A post-invoke hook: runs against the context after its handler returned
/// a non-empty value (and after the body assignment, so it can override).
pub type HookFn = Arc<dyn Fn(&mut Context, &Value) + Send + Sync>;

/// Canonical hooks.
pub mod hook {
    use super::*;

    /// Forces the response status once the handler has produced a body.
    pub fn status(code: u16) -> HookFn {
        Arc::new(move |ctx, _| ctx.status = code)
    }

    /// Forces the response media type once the handler has produced a body.
    pub fn media_type(value: impl Into<String>) -> HookFn {
        let value = value.into();
        Arc::new(move |ctx, _| ctx.media_type = Some(value.clone()))
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

struct RouteDecl {
    verb: Method,
    /// `None` defaults to the handler name, mirroring un-parameterized
    /// route declarations.
    path: Option<String>,
    handler: &'static str,
}

/// Accumulates a controller's metadata; [`build`](Self::build) seals it.
///
/// ```rust
/// use decor::{hook, ControllerBuilder, Extractor, Method};
/// # use decor::{BoxFuture, Context, Controller, Error, HandlerArg};
/// # use serde_json::Value;
/// # struct UserController;
/// # impl Controller for UserController {
/// #     fn invoke<'a>(&'a mut self, h: &'a str, _: &'a mut Context, _: Vec<HandlerArg>)
/// #         -> BoxFuture<'a, Result<Option<Value>, Error>> {
/// #         Box::pin(async move { Ok(None) })
/// #     }
/// # }
///
/// let def = ControllerBuilder::new("UserController", "/api")
///     .constructor(|_| Ok(Box::new(UserController)))
///     .route(Method::Get, "/user/:id", "detail")
///     .parameter("detail", 0, Extractor::Params(None))
///     .hook("detail", hook::media_type("application/json"))
///     .build()
///     .expect("routing table is unambiguous");
/// ```
pub struct ControllerBuilder {
    name: &'static str,
    route: String,
    routes: Vec<RouteDecl>,
    parameters: HashMap<&'static str, Vec<Option<Extractor>>>,
    properties: Vec<(String, Extractor)>,
    hooks: HashMap<&'static str, HookFn>,
    services: Vec<ServiceDep>,
    constructor: Option<ConstructorFn>,
}

impl ControllerBuilder {
    /// Starts a controller rooted at `base_route`. Runs once per controller;
    /// the base is normalized to single leading and trailing slashes.
    pub fn new(name: &'static str, base_route: impl Into<String>) -> Self {
        Self {
            name,
            route: base_route.into(),
            routes: Vec::new(),
            parameters: HashMap::new(),
            properties: Vec::new(),
            hooks: HashMap::new(),
            services: Vec::new(),
            constructor: None,
        }
    }

    /// Declares a constructor dependency. Order matters: dependencies are
    /// checked (and conventionally consumed) in declaration order.
    pub fn service<S: Any>(mut self) -> Self {
        self.services.push(ServiceDep::of::<S>());
        self
    }

    /// Stores the instance factory the dispatch loop runs per request.
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Services) -> Result<Box<dyn Controller>, Error> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Declares a route: `verb` + `path` resolve to `handler`.
    pub fn route(mut self, verb: Method, path: impl Into<String>, handler: &'static str) -> Self {
        self.routes.push(RouteDecl { verb, path: Some(path.into()), handler });
        self
    }

    /// Declares a route whose path is the handler name itself.
    pub fn route_default(mut self, verb: Method, handler: &'static str) -> Self {
        self.routes.push(RouteDecl { verb, path: None, handler });
        self
    }

    /// Binds an extractor at one parameter index of one handler. Binding
    /// never disturbs other indices; unbound indices resolve to
    /// [`HandlerArg::Missing`].
    pub fn parameter(mut self, handler: &'static str, index: usize, extractor: Extractor) -> Self {
        let slots = self.parameters.entry(handler).or_default();
        if slots.len() <= index {
            slots.resize_with(index + 1, || None);
        }
        slots[index] = Some(extractor);
        self
    }

    /// Binds an extractor to an injected property. Re-binding the same name
    /// overwrites.
    pub fn property(mut self, name: impl Into<String>, extractor: Extractor) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = extractor,
            None => self.properties.push((name, extractor)),
        }
        self
    }

    /// Attaches a post-invoke hook to a handler. Re-attaching overwrites.
    pub fn hook(mut self, handler: &'static str, hook: HookFn) -> Self {
        self.hooks.insert(handler, hook);
        self
    }

    /// Seals the metadata: normalizes every path, rejects duplicate
    /// verb + path pairs, compiles the matchers.
    ///
    /// Registration errors are fatal: propagate them out of `main` and let
    /// startup abort rather than running with an ambiguous routing table.
    pub fn build(self) -> Result<ControllerDef, Error> {
        let constructor = self.constructor
            .ok_or(Error::MissingConstructor { controller: self.name })?;

        let base = normalize_base(&self.route);

        let mut seen: HashMap<Method, Vec<String>> = HashMap::new();
        let mut compiled = Vec::with_capacity(self.routes.len());
        for decl in &self.routes {
            let raw = normalize_path(decl.path.as_deref().unwrap_or(decl.handler));

            // Uniqueness runs on the normalized method path, before
            // compilation, scoped to this controller and verb.
            let paths = seen.entry(decl.verb).or_default();
            if paths.contains(&raw) {
                return Err(Error::DuplicateRoute {
                    controller: self.name,
                    handler: decl.handler,
                    verb: decl.verb,
                    path: raw,
                });
            }
            paths.push(raw.clone());

            compiled.push(compile(self.name, decl.handler, decl.verb, &base, &raw)?);
        }

        Ok(ControllerDef {
            name: self.name,
            route: base,
            compiled,
            parameters: self.parameters,
            properties: self.properties,
            hooks: self.hooks,
            services: self.services,
            constructor,
        })
    }
}

// ── Sealed definition ─────────────────────────────────────────────────────────

/// A controller's sealed metadata: compiled routes, bindings, hooks, and
/// constructor. Immutable for the process lifetime once registered.
pub struct ControllerDef {
    name: &'static str,
    route: String,
    compiled: Vec<CompiledRoute>,
    parameters: HashMap<&'static str, Vec<Option<Extractor>>>,
    properties: Vec<(String, Extractor)>,
    hooks: HashMap<&'static str, HookFn>,
    services: Vec<ServiceDep>,
    constructor: ConstructorFn,
}

impl ControllerDef {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The normalized base prefix.
    pub fn base_route(&self) -> &str {
        &self.route
    }

    /// Compiled routes as `(verb, full path, handler)`, in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str, &str)> {
        self.compiled.iter().map(|r| (r.verb, r.route_path.as_str(), r.handler))
    }

    /// Every compiled route admitting `method` that matches `path`, with its
    /// captures, in declaration order.
    pub(crate) fn match_routes(
        &self,
        method: Method,
        path: &str,
    ) -> Vec<(&CompiledRoute, Vec<(String, String)>)> {
        self.compiled.iter()
            .filter(|route| route.verb.admits(method))
            .filter_map(|route| route.matches(path).map(|caps| (route, caps)))
            .collect()
    }

    /// Resolves `handler`'s declared parameters against the context. Holes
    /// become [`HandlerArg::Missing`]; a handler with no bindings gets an
    /// empty vector.
    pub(crate) fn resolve_args(&self, handler: &str, ctx: &Context) -> Vec<HandlerArg> {
        self.parameters.get(handler)
            .map(|slots| {
                slots.iter()
                    .map(|slot| slot.as_ref()
                        .map_or(HandlerArg::Missing, |extractor| extractor.extract(ctx)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn hook_for(&self, handler: &str) -> Option<&HookFn> {
        self.hooks.get(handler)
    }

    /// Verifies declared services and runs the constructor — one fresh
    /// instance per call.
    pub(crate) fn instantiate(&self, services: &Services) -> Result<Box<dyn Controller>, Error> {
        for dep in &self.services {
            if !services.contains(dep) {
                return Err(Error::ServiceNotFound { name: dep.name });
            }
        }
        (self.constructor)(services)
    }

    /// Applies property bindings onto a fresh instance.
    pub(crate) fn inject(&self, instance: &mut dyn Controller, ctx: &Context) {
        for (name, extractor) in &self.properties {
            instance.assign(name, extractor.extract(ctx));
        }
    }
}
