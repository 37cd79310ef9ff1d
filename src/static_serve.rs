//! Static-file collaborator.
//!
//! Dispatch offers every request to this interface twice: once before
//! matching ([`StaticServe::handler`]) and once after, if nothing finished
//! the request ([`StaticServe::defer_handler`]). An implementation answers
//! by filling the context's response state and calling
//! [`Context::finish`](crate::Context::finish); leaving the context
//! untouched passes.
//!
//! [`StaticDir`] is the thin built-in: one root directory, an index file
//! for directory paths, and a `defer` switch selecting which of the two
//! passes it answers in. Deferred mode is the "serve index.html if no route
//! matched" pattern. File-serving niceties (ranges, caching headers,
//! compression) belong to a real file server, not here.

use std::path::{Path, PathBuf};

use crate::context::{Context, Payload};
use crate::controller::BoxFuture;
use crate::error::Error;
use crate::method::Method;

/// The static-serving contract dispatch depends on.
pub trait StaticServe: Send + Sync {
    /// Pre-dispatch attempt. Sets `ctx.finished` when it fully answers.
    fn handler<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>>;

    /// Post-dispatch fallback. Sets `ctx.finished` when it fully answers.
    fn defer_handler<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>>;
}

/// Serves files from one directory.
pub struct StaticDir {
    root: PathBuf,
    index: String,
    defer: bool,
}

impl StaticDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: "index.html".to_owned(),
            defer: false,
        }
    }

    /// Answer in the post-dispatch pass instead of the pre-dispatch one.
    pub fn deferred(mut self) -> Self {
        self.defer = true;
        self
    }

    /// The file served for directory paths. Defaults to `index.html`.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = name.into();
        self
    }

    async fn try_serve(&self, ctx: &mut Context) -> Result<(), Error> {
        if !matches!(ctx.request.method, Method::Get | Method::Head) {
            return Ok(());
        }

        let rel = ctx.request.path.trim_start_matches('/');
        // No escaping the root.
        if rel.split('/').any(|part| part == "..") {
            return Ok(());
        }

        let mut path = self.root.join(rel);
        let is_dir = rel.is_empty()
            || ctx.request.path.ends_with('/')
            || tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            path.push(&self.index);
        }

        // Unreadable or absent files simply pass; the request stays live
        // for the routing stages.
        if let Ok(data) = tokio::fs::read(&path).await {
            ctx.status = 200;
            ctx.body = Some(Payload::Bytes {
                media_type: media_type_for(&path).to_owned(),
                data,
            });
            ctx.finish();
        }
        Ok(())
    }
}

impl StaticServe for StaticDir {
    fn handler<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if self.defer { Ok(()) } else { self.try_serve(ctx).await }
        })
    }

    fn defer_handler<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if self.defer { self.try_serve(ctx).await } else { Ok(()) }
        })
    }
}

fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css")          => "text/css; charset=utf-8",
        Some("gif")          => "image/gif",
        Some("htm" | "html") => "text/html; charset=utf-8",
        Some("ico")          => "image/x-icon",
        Some("jpeg" | "jpg") => "image/jpeg",
        Some("js" | "mjs")   => "text/javascript; charset=utf-8",
        Some("json")         => "application/json",
        Some("png")          => "image/png",
        Some("svg")          => "image/svg+xml",
        Some("txt")          => "text/plain; charset=utf-8",
        Some("wasm")         => "application/wasm",
        Some("woff2")        => "font/woff2",
        _                    => "application/octet-stream",
    }
}
