//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The route table needs to hold handlers of *different* types in a single
//! `Vec` per method. Rust collections can only hold one concrete type, so we
//! use **trait objects** (`dyn ErasedHandler`) to hide the concrete handler
//! type behind a common interface and store everything uniformly.
//!
//! ```text
//! async fn hello(ctx: Context) -> Response { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(ctx)  at dispatch time              ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(ctx).await.into_result() })  ← BoxFuture
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future.
///
/// `Send + 'a` lets tokio move the future across worker threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe view of a handler, used by the route table at dispatch.
///
/// Public only because [`Handler::into_boxed_handler`] returns it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Response, Error>>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── HandlerOutput ─────────────────────────────────────────────────────────────

/// What a handler may return.
///
/// Anything that implements [`IntoResponse`] succeeds. A `Result` whose error
/// converts into a [`BoxError`] fails on `Err`; the failure unwinds through the
/// middleware chain and [`Router::run`](crate::Router::run) answers `500`.
pub trait HandlerOutput {
    fn into_result(self) -> Result<Response, Error>;
}

impl<T: IntoResponse> HandlerOutput for T {
    fn into_result(self) -> Result<Response, Error> {
        Ok(self.into_response())
    }
}

impl<T, E> HandlerOutput for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<Response, Error> {
        self.map(IntoResponse::into_response).map_err(Error::handler)
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// A route handler.
///
/// Satisfied by every `Send + Sync` function or closure of the shape:
///
/// ```text
/// async fn name(ctx: Context) -> impl HandlerOutput
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Response, Error>> {
        let fut = (self.0)(ctx);
        Box::pin(async move { fut.await.into_result() })
    }
}
