//! The controller registry and the per-request dispatch loop.
//!
//! The registry is built once at startup — controllers in registration
//! order, the service instances they depend on, optionally a static-serving
//! collaborator — and is read-only from then on. Requests share it behind an
//! `Arc` without locking, because nothing on the request path mutates it.
//!
//! # Dispatch, step by step
//!
//! [`Registry::dispatch`] is the single entry point the host calls per
//! request. The stages run strictly in order:
//!
//! 1. **Static pre-pass** — the static collaborator gets first refusal; if
//!    it marks the context finished, dispatch stops here.
//! 2. **Match** — every controller, in registration order, tests every
//!    compiled route, in declaration order, against the request method and
//!    path. *All* matches are collected: more than one controller (say, an
//!    access logger on `ALL /` plus the data controller) may fire for one
//!    request. Captured path parameters land in
//!    `ctx.params`, later matches overwriting earlier keys.
//! 3. **Instantiate / inject / invoke** — per matched controller: declared
//!    services are verified, the constructor runs (one fresh instance per
//!    request), property bindings are assigned, then each matched handler
//!    is invoked in order with its resolved arguments. A non-empty result
//!    sets status 200 and replaces the response body — last writer wins —
//!    and then the handler's hook, if any, runs against the context.
//! 4. **Static post-pass** — if nothing finished the request, the deferred
//!    static pass gets it (the "serve index.html as a fallback" pattern).
//!
//! Zero matches leave the context untouched; 404 semantics belong to the
//! host. Any error from stage 3 propagates out of `dispatch`, aborting the
//! remaining handlers for this request and nothing else.

use serde_json::Value;
use tracing::debug;

use crate::context::{Context, MatchedRoute};
use crate::controller::ControllerDef;
use crate::error::Error;
use crate::service::Services;
use crate::static_serve::StaticServe;

/// The process-wide routing table. Build at startup, share behind an `Arc`.
pub struct Registry {
    controllers: Vec<ControllerDef>,
    services: Services,
    static_serve: Option<Box<dyn StaticServe>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            services: Services::new(),
            static_serve: None,
        }
    }

    /// Registers a controller. Registration order is match order.
    pub fn controller(mut self, def: ControllerDef) -> Self {
        self.controllers.push(def);
        self
    }

    /// Registers a service instance for constructor injection.
    pub fn service<S: std::any::Any + Send + Sync>(mut self, service: S) -> Self {
        self.services.register(service);
        self
    }

    /// Attaches the static-serving collaborator.
    pub fn static_serve(mut self, serve: impl StaticServe + 'static) -> Self {
        self.static_serve = Some(Box::new(serve));
        self
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Runs the full dispatch state machine for one request.
    pub async fn dispatch(&self, ctx: &mut Context) -> Result<(), Error> {
        if let Some(serve) = &self.static_serve {
            serve.handler(ctx).await?;
            if ctx.finished {
                return Ok(());
            }
        }

        let selected = self.match_all(ctx);
        debug!(
            method = %ctx.request.method,
            path = %ctx.request.path,
            matches = ctx.matched.len(),
            "dispatch"
        );

        for (index, handlers) in selected {
            let def = &self.controllers[index];
            let mut instance = def.instantiate(&self.services)?;
            def.inject(instance.as_mut(), ctx);

            for handler in handlers {
                let args = def.resolve_args(handler, ctx);
                let result = instance.invoke(handler, ctx, args).await?;

                let Some(value) = result else { continue };
                if empty(&value) {
                    continue;
                }
                match def.hook_for(handler) {
                    Some(hook) => {
                        let snapshot = value.clone();
                        ctx.set_body(value);
                        hook(ctx, &snapshot);
                    }
                    None => ctx.set_body(value),
                }
            }
        }

        if !ctx.finished {
            if let Some(serve) = &self.static_serve {
                serve.defer_handler(ctx).await?;
            }
        }

        Ok(())
    }

    /// Stage 2: collect every matching (controller, handler) pair, grouped
    /// per controller, and record captures and the match scratch.
    fn match_all(&self, ctx: &mut Context) -> Vec<(usize, Vec<&'static str>)> {
        let mut selected = Vec::new();

        for (index, def) in self.controllers.iter().enumerate() {
            let matched = def.match_routes(ctx.request.method, &ctx.request.path);
            if matched.is_empty() {
                continue;
            }

            let mut handlers = Vec::with_capacity(matched.len());
            for (route, captures) in matched {
                for (name, value) in captures {
                    ctx.params.insert(name, Value::String(value));
                }
                ctx.matched.push(MatchedRoute {
                    controller: def.name(),
                    handler: route.handler,
                    route_path: route.route_path.clone(),
                });
                handlers.push(route.handler);
            }
            selected.push((index, handlers));
        }

        selected
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// The values that do *not* count as a response: `Null` and the empty
/// string. Everything else — including `0` and `false` — assigns the body.
fn empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_null_and_empty_string_are_empty() {
        assert!(empty(&Value::Null));
        assert!(empty(&json!("")));
        assert!(!empty(&json!(0)));
        assert!(!empty(&json!(false)));
        assert!(!empty(&json!([])));
        assert!(!empty(&json!({})));
        assert!(!empty(&json!("x")));
    }
}
