//! # decor
//!
//! A declarative controller and request-dispatch layer for HTTP services.
//! Controllers declare their routes, parameter bindings, injected
//! properties, and constructor services as metadata; decor seals that
//! metadata once at startup and drives every request through it.
//!
//! ## The contract
//!
//! The core owns exactly the part that changes between applications:
//!
//! - **Metadata** — a builder per controller, sealed into an immutable
//!   definition; duplicate routes abort startup, not requests
//! - **Matching** — every registered controller is tested in registration
//!   order and *every* match fires, so cross-cutting controllers (access
//!   logs, audit trails) compose with data controllers on the same path
//! - **Argument resolution** — a closed set of extractors projects request
//!   data into handler parameters and injected properties; validation
//!   failures are data the handler inspects, never control flow
//! - **Dispatch** — static pre-pass, match, instantiate, inject, invoke,
//!   static post-pass, in that order, every time
//!
//! Everything else is a collaborator behind a narrow interface: the socket
//! and TLS belong to the host server, file serving to [`StaticServe`],
//! session persistence to [`SessionStore`], multipart parsing to whoever
//! fills `RequestParts::files`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use decor::{
//!     BoxFuture, Context, Controller, ControllerBuilder, Error, Extractor,
//!     HandlerArg, Method, Registry, Server,
//! };
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
//!                     let id = args.first()
//!                         .and_then(HandlerArg::value)
//!                         .and_then(|params| params.get("id").cloned())
//!                         .unwrap_or(Value::Null);
//!                     Ok(Some(json!({ "id": id })))
//!                 }
//!                 _ => Err(Error::UnknownHandler {
//!                     controller: "UserController",
//!                     handler: handler.to_owned(),
//!                 }),
//!             }
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let users = ControllerBuilder::new("UserController", "/api")
//!         .constructor(|_| Ok(Box::new(UserController)))
//!         .route(Method::Get, "/user/:id", "detail")
//!         .parameter("detail", 0, Extractor::Params(None))
//!         .build()?;
//!
//!     let registry = Registry::new().controller(users);
//!     Server::bind("0.0.0.0:3000").serve(registry).await
//! }
//! ```

mod context;
mod controller;
mod error;
mod extract;
mod method;
mod registry;
mod router;
mod server;
mod service;
mod session;
mod static_serve;
mod validate;

pub mod body;

pub use context::{Context, MatchedRoute, Payload, RequestParts};
pub use controller::{
    hook, BoxFuture, ConstructorFn, Controller, ControllerBuilder, ControllerDef, HookFn,
};
pub use error::Error;
pub use extract::{Extractor, HandlerArg, Validated};
pub use method::Method;
pub use registry::Registry;
pub use server::Server;
pub use service::{ServiceDep, Services};
pub use session::{SessionStore, SESSION_COOKIE};
pub use static_serve::{StaticDir, StaticServe};
pub use validate::{validate, FieldRule, FieldRules};
