//! HTTP host server.
//!
//! The host's job is everything the dispatch core declared external: accept
//! connections, parse one request into a [`Context`] (query string, body,
//! headers, session), call [`Registry::dispatch`] exactly once, and render
//! whatever the context ends up holding. An untouched context renders the
//! default `404`; a dispatch error renders `500` and is logged — that is
//! the "host exception handler" the failure semantics point at.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the accept loop stops immediately and every
//! in-flight connection runs to completion before [`Server::serve`]
//! returns. Size your orchestrator's grace period to your slowest request.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde_json::Map;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::body;
use crate::context::{Context, Payload, RequestParts};
use crate::error::Error;
use crate::method::Method;
use crate::registry::Registry;
use crate::session::{SessionStore, SESSION_COOKIE};

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `registry`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, registry: Registry) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared across connection tasks: the routing table is read-only,
        // the session store synchronizes internally.
        let registry = Arc::new(registry);
        let sessions = Arc::new(SessionStore::new());

        info!(addr = %self.addr, "decor listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal
                // stops the accept loop even when connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let registry = Arc::clone(&registry);
                    let sessions = Arc::clone(&sessions);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // The closure runs once per request on the
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let registry = Arc::clone(&registry);
                            let sessions = Arc::clone(&sessions);
                            async move { handle(registry, sessions, req).await }
                        });

                        // `auto::Builder` handles both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("decor stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// One request end to end: context in, response out. The error type is
/// [`Infallible`](std::convert::Infallible) — every failure becomes a
/// status code here, hyper never sees an error.
async fn handle(
    registry: Arc<Registry>,
    sessions: Arc<SessionStore>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let method = match req.method().as_str().parse::<Method>() {
        Ok(m) if m != Method::All => m,
        _ => return Ok(plain_status(405)),
    };

    let path = req.uri().path().to_owned();
    let querystring = req.uri().query().unwrap_or("").to_owned();

    let headers: Vec<(String, String)> = req.headers().iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    let raw_body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Ok(plain_status(400)),
    };

    let mut parts = RequestParts::new(method, path);
    parts.query = body::parse_query(&querystring);
    parts.querystring = querystring;
    parts.body = body::parse(
        headers.iter()
            .find(|(k, _)| k == "content-type")
            .map(|(_, v)| v.as_str()),
        &raw_body,
    );
    parts.headers = headers;

    // A cookie pointing at a live session restores it; anything else gets
    // a fresh id and a set-cookie on the way out.
    let existing: Option<(String, Map<String, serde_json::Value>)> =
        session_id(&parts).and_then(|sid| sessions.get(&sid).map(|data| (sid, data)));
    let set_cookie = existing.is_none();
    let (sid, session) = existing.unwrap_or_else(|| (sessions.generate_id(), Map::new()));

    let mut ctx = Context::new(parts);
    ctx.session = session;

    if let Err(e) = registry.dispatch(&mut ctx).await {
        error!("dispatch error: {e}");
        return Ok(plain_status(500));
    }

    sessions.set(&sid, ctx.session.clone());

    Ok(render(ctx, set_cookie.then_some(sid)))
}

/// The session id from the request's cookie header, if any.
fn session_id(parts: &RequestParts) -> Option<String> {
    parts.header("cookie")?.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_owned())
    })
}

/// Renders the finished context into a hyper response.
fn render(ctx: Context, new_sid: Option<String>) -> http::Response<Full<Bytes>> {
    let (data, media_type) = match ctx.body {
        Some(Payload::Json(value)) => (
            serde_json::to_vec(&value).unwrap_or_default(),
            "application/json".to_owned(),
        ),
        Some(Payload::Text(text)) => (
            text.into_bytes(),
            "text/plain; charset=utf-8".to_owned(),
        ),
        Some(Payload::Bytes { media_type, data }) => (data, media_type),
        None => (Vec::new(), "text/plain; charset=utf-8".to_owned()),
    };

    let status = match ctx.status {
        0 if data.is_empty() => 404,
        0 => 200,
        s => s,
    };

    let mut builder = http::Response::builder()
        .status(http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR))
        .header("content-type", ctx.media_type.unwrap_or(media_type));

    for (name, value) in &ctx.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(sid) = new_sid {
        builder = builder.header(
            "set-cookie",
            format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly"),
        );
    }

    builder
        .body(Full::new(Bytes::from(data)))
        .unwrap_or_else(|_| plain_status(500))
}

fn plain_status(code: u16) -> http::Response<Full<Bytes>> {
    http::Response::builder()
        .status(code)
        .body(Full::new(Bytes::new()))
        .expect("static response")
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM (sent by orchestrators) and SIGINT
/// (Ctrl-C, for local dev). On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
