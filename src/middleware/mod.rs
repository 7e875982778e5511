//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: authentication, CORS, access logging, static
//! file serving.
//!
//! # The onion
//!
//! Middlewares registered as `A, B, C` around a terminal `T` run as:
//!
//! ```text
//! A-enter → B-enter → C-enter → T → C-exit → B-exit → A-exit
//! ```
//!
//! Code before `next.run().await` runs on the way in, code after it on the
//! way out. Returning without calling `next` short-circuits everything
//! downstream, including the route handler.
//!
//! Any closure of the shape `Fn(Request, Next) -> impl Future<Output =
//! Result<Response, Error>>` is a middleware:
//!
//! ```rust
//! use trellis::{Router, Request, Response};
//! use trellis::middleware::Next;
//!
//! let app = Router::new().middleware(|req: Request, next: Next| async move {
//!     let mut res = next.run().await?;
//!     res.set_header("x-path", req.path());
//!     Ok::<_, trellis::Error>(res)
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

pub mod auth;
pub mod cors;
pub mod logger;
pub mod static_files;

pub use auth::{AuthError, AuthOptions, BearerAuth, ExcludePath};
pub use cors::{AllowOrigin, Cors, CorsOptions};
pub use logger::{Logger, LoggerOptions};
pub use static_files::{Static, StaticOptions};

/// The innermost continuation of a chain: the matched route handler, or the
/// fixed not-found response.
pub type Terminal = Box<dyn FnOnce() -> BoxFuture<'static, Result<Response, Error>> + Send>;

/// A request interceptor.
///
/// Implemented automatically for closures; implement it directly for
/// middleware that carries configuration.
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Result<Response, Error>>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin((self)(req, next))
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

// ── Next ──────────────────────────────────────────────────────────────────────

/// The rest of the pipeline, as seen from one middleware.
///
/// [`Next::run`] consumes the continuation, so it can be invoked at most
/// once. Dropping it without running is a short-circuit.
pub struct Next {
    chain: Arc<Vec<BoxedMiddleware>>,
    index: usize,
    request: Request,
    terminal: Terminal,
}

impl Next {
    /// Runs every remaining middleware and then the terminal.
    pub async fn run(self) -> Result<Response, Error> {
        let Next { chain, index, request, terminal } = self;
        match chain.get(index).cloned() {
            Some(middleware) => {
                let next = Next { chain, index: index + 1, request: request.clone(), terminal };
                middleware.call(request, next).await
            }
            None => terminal().await,
        }
    }

    /// The request flowing through the chain.
    pub fn request(&self) -> &Request { &self.request }
}

// ── MiddlewareChain ───────────────────────────────────────────────────────────

/// An ordered, append-only list of middlewares.
///
/// Shared read-only by every dispatch once registration is over. Appending
/// to a chain that is already shared copies it first, so a running
/// dispatch never observes a later registration.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<BoxedMiddleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, middleware: impl Middleware) -> &mut Self {
        Arc::make_mut(&mut self.middlewares).push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize { self.middlewares.len() }
    pub fn is_empty(&self) -> bool { self.middlewares.is_empty() }

    /// Runs `req` through every middleware in registration order, ending in
    /// `terminal`.
    pub async fn execute(&self, req: Request, terminal: Terminal) -> Result<Response, Error> {
        Next {
            chain: Arc::clone(&self.middlewares),
            index: 0,
            request: req,
            terminal,
        }
        .run()
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap().into()
    }

    fn recording(log: &Log, name: &'static str) -> impl Middleware {
        let log = Arc::clone(log);
        move |_req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name}-enter"));
                let res = next.run().await;
                log.lock().unwrap().push(format!("{name}-exit"));
                res
            }
        }
    }

    fn terminal(log: &Log) -> Terminal {
        let log = Arc::clone(log);
        Box::new(move || -> BoxFuture<'static, Result<Response, Error>> {
            Box::pin(async move {
                log.lock().unwrap().push("T".to_owned());
                Ok(Response::text("done"))
            })
        })
    }

    #[tokio::test]
    async fn runs_as_an_onion() {
        let log = Log::default();
        let mut chain = MiddlewareChain::new();
        chain
            .push(recording(&log, "A"))
            .push(recording(&log, "B"))
            .push(recording(&log, "C"));

        let res = chain.execute(request(), terminal(&log)).await.unwrap();

        assert_eq!(res.body(), b"done");
        assert_eq!(
            *log.lock().unwrap(),
            ["A-enter", "B-enter", "C-enter", "T", "C-exit", "B-exit", "A-exit"],
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_downstream() {
        let log = Log::default();
        let mut chain = MiddlewareChain::new();
        chain
            .push(recording(&log, "A"))
            .push(|_req: Request, _next: Next| async move {
                Ok::<_, Error>(Response::status(StatusCode::UNAUTHORIZED))
            })
            .push(recording(&log, "C"));

        let res = chain.execute(request(), terminal(&log)).await.unwrap();

        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(*log.lock().unwrap(), ["A-enter", "A-exit"]);
    }

    #[tokio::test]
    async fn empty_chain_runs_terminal() {
        let log = Log::default();
        let res = MiddlewareChain::new().execute(request(), terminal(&log)).await.unwrap();
        assert_eq!(res.body(), b"done");
        assert_eq!(*log.lock().unwrap(), ["T"]);
    }

    #[tokio::test]
    async fn middleware_post_processes_the_response() {
        let mut chain = MiddlewareChain::new();
        chain.push(|_req: Request, next: Next| async move {
            let mut res = next.run().await?;
            res.set_header("x-seen", "yes");
            Ok::<_, Error>(res)
        });

        let res = chain.execute(request(), terminal(&Log::default())).await.unwrap();
        assert_eq!(res.header("x-seen"), Some("yes"));
    }

    #[tokio::test]
    async fn failures_propagate_through_middleware() {
        let log = Log::default();
        let mut chain = MiddlewareChain::new();
        chain.push(recording(&log, "A"));

        let failing: Terminal = Box::new(|| -> BoxFuture<'static, Result<Response, Error>> {
            Box::pin(async { Err(Error::handler("nope")) })
        });
        let err = chain.execute(request(), failing).await.unwrap_err();

        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(*log.lock().unwrap(), ["A-enter", "A-exit"]);
    }

    #[tokio::test]
    async fn push_after_clone_leaves_the_clone_untouched() {
        let mut chain = MiddlewareChain::new();
        chain.push(|_req: Request, next: Next| next.run());
        let frozen = chain.clone();

        chain.push(|_req: Request, next: Next| next.run());

        assert_eq!(frozen.len(), 1);
        assert_eq!(chain.len(), 2);
    }
}
