//! Minimal decor example — two controllers sharing the same paths.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/user/42
//!   curl -X POST http://localhost:3000/api/user \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X POST http://localhost:3000/api/user \
//!        -H 'content-type: application/json' \
//!        -d '{}'
//!
//! The `AuditController` declares the same paths as `UserController` under
//! the `ALL` verb — both controllers match, both handlers run in
//! registration order, and the last non-empty return value wins the
//! response body.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use decor::{
    hook, BoxFuture, Context, Controller, ControllerBuilder, Error, Extractor, FieldRule,
    FieldRules, HandlerArg, Method, Registry, Server,
};
use serde_json::{json, Value};

/// Process-wide request counter, injected into `AuditController`.
struct Stats {
    requests: AtomicU64,
}

// ── AuditController ───────────────────────────────────────────────────────────

struct AuditController {
    stats: Arc<Stats>,
}

impl Controller for AuditController {
    fn invoke<'a>(
        &'a mut self,
        handler: &'a str,
        ctx: &'a mut Context,
        _args: Vec<HandlerArg>,
    ) -> BoxFuture<'a, Result<Option<Value>, Error>> {
        Box::pin(async move {
            match handler {
                "log" => {
                    let n = self.stats.requests.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::info!(
                        method = %ctx.request.method,
                        path = %ctx.request.path,
                        total = n,
                        "request"
                    );
                    // Nothing to say to the client; the next controller owns
                    // the body.
                    Ok(None)
                }
                _ => Err(Error::UnknownHandler {
                    controller: "AuditController",
                    handler: handler.to_owned(),
                }),
            }
        })
    }
}

// ── UserController ────────────────────────────────────────────────────────────

#[derive(Default)]
struct UserController {
    language: Option<Value>,
}

impl Controller for UserController {
    fn invoke<'a>(
        &'a mut self,
        handler: &'a str,
        _ctx: &'a mut Context,
        args: Vec<HandlerArg>,
    ) -> BoxFuture<'a, Result<Option<Value>, Error>> {
        Box::pin(async move {
            match handler {
                // GET /api/user/:id
                "detail" => {
                    let id = args.first()
                        .and_then(HandlerArg::value)
                        .and_then(|params| params.get("id").cloned())
                        .unwrap_or(Value::Null);
                    Ok(Some(json!({
                        "id": id,
                        "name": "alice",
                        "language": self.language,
                    })))
                }
                // POST /api/user — body validated by the extractor, reported
                // by the handler.
                "create" => {
                    let Some(body) = args.first().and_then(HandlerArg::validated) else {
                        return Ok(Some(json!({ "error": "no body" })));
                    };
                    if let Some(errors) = body.error() {
                        return Ok(Some(json!({ "errors": errors })));
                    }
                    Ok(Some(json!({ "created": body.data })))
                }
                _ => Err(Error::UnknownHandler {
                    controller: "UserController",
                    handler: handler.to_owned(),
                }),
            }
        })
    }

    fn assign(&mut self, property: &str, value: HandlerArg) {
        if property == "language" {
            self.language = value.value()
                .and_then(|headers| headers.get("accept-language").cloned());
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let audit = ControllerBuilder::new("AuditController", "/")
        .service::<Stats>()
        .constructor(|services| {
            Ok(Box::new(AuditController { stats: services.get::<Stats>()? }))
        })
        .route(Method::All, "/api/user", "log")
        .route(Method::All, "/api/user/:id", "log")
        .build()
        .expect("audit routes");

    let users = ControllerBuilder::new("UserController", "/api")
        .constructor(|_| Ok(Box::new(UserController::default())))
        .route(Method::Get, "/user/:id", "detail")
        .parameter("detail", 0, Extractor::Params(None))
        .route(Method::Post, "/user", "create")
        .parameter(
            "create",
            0,
            Extractor::Body(Some(
                FieldRules::new()
                    .field("name", FieldRule::new().required().min_length(2))
                    .field("role", FieldRule::new().default_value("user")),
            )),
        )
        .hook("create", hook::status(201))
        .property("language", Extractor::Headers(Some(vec!["accept-language".into()])))
        .build()
        .expect("user routes");

    let registry = Registry::new()
        .service(Stats { requests: AtomicU64::new(0) })
        .controller(audit)
        .controller(users);

    Server::bind("0.0.0.0:3000")
        .serve(registry)
        .await
        .expect("server error");
}
