//! The application router.
//!
//! Registration builds a route table and a middleware chain; [`Router::run`]
//! dispatches one request through them:
//!
//! ```text
//! find(method, path) ── miss ──→ terminal = 404 Not Found
//!        │ hit
//!        ↓
//! Context { request, params } → terminal = handler(ctx)
//!        ↓
//! middleware chain (onion) around the terminal
//!        ↓
//! Response   (Err or panic anywhere → 500 Internal Server Error)
//! ```

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::Method;
use tracing::{debug, error};

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxFuture, ErasedHandler, Handler};
use crate::middleware::{Middleware, MiddlewareChain, Terminal};
use crate::request::Request;
use crate::response::Response;
use crate::route::{RouteMatch, RouteTable};

/// The application router.
///
/// Build it once at startup; every registration consumes and returns `self`
/// so calls chain naturally. Once built it is read-only and can serve any
/// number of concurrent dispatches (the server wraps it in an `Arc`).
pub struct Router {
    routes: RouteTable,
    middleware: MiddlewareChain,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: RouteTable::new(), middleware: MiddlewareChain::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `:name` syntax; `ctx.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use trellis::{Context, Method, Response, Router};
    /// # async fn get_user(_: Context) -> Response { Response::text("") }
    /// # async fn purge(_: Context) -> Response { Response::text("") }
    /// Router::new()
    ///     .get("/users/:id", get_user)
    ///     .on(Method::from_bytes(b"PURGE").unwrap(), "/cache/:key", purge);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template (a parameter name repeats).
    /// A bad route is a programming error and should stop startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .register(method, path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Append a middleware. Middlewares run in registration order on the way
    /// in and in reverse order on the way out.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn routes(&self) -> &RouteTable { &self.routes }

    /// Dispatches one request and always produces a response.
    ///
    /// A routing miss is a normal `404`. Any error or panic raised by a
    /// middleware or handler is logged and answered with `500`; nothing
    /// escapes to the caller.
    pub async fn run(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.path().to_owned();

        let terminal: Terminal = match self.routes.find(&method, &path) {
            Some(RouteMatch { handler, params }) => {
                let ctx = Context::new(req.clone(), params);
                Box::new(move || handler.call(ctx))
            }
            None => {
                debug!(%method, %path, "no route matched");
                Box::new(|| -> BoxFuture<'static, Result<Response, Error>> {
                    Box::pin(async { Ok(Response::not_found()) })
                })
            }
        };

        let outcome = AssertUnwindSafe(self.middleware.execute(req, terminal))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(Error::from_panic(payload)));

        match outcome {
            Ok(res) => res,
            Err(e) => {
                error!(%method, %path, error = %e, "router error");
                Response::internal_error()
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
