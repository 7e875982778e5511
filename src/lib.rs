//! # trellis
//!
//! A minimal HTTP router with composable middleware.
//!
//! ## The contract
//!
//! One immutable [`Request`] in, one [`Response`] out. trellis does three
//! things and nothing else:
//!
//! - **Path patterns**: `/users/:id/posts/:postId`, anchored, compiled once
//!   at registration
//! - **First-match routing**: per method, in registration order; order is
//!   the only precedence rule
//! - **Onion middleware**: each middleware sees the request on the way in
//!   and the response on the way out, and may short-circuit
//!
//! Every dispatch ends in exactly one response: a miss is `404 Not Found`,
//! and an error or panic anywhere in the chain is `500 Internal Server
//! Error`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{Context, Response, Router, Server, StatusCode};
//! use trellis::middleware::{Cors, Logger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .middleware(Logger::default())
//!         .middleware(Cors::default())
//!         .get("/users/:id", get_user)
//!         .post("/users", create_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(ctx: Context) -> Response {
//!     let id = ctx.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(ctx: Context) -> Response {
//!     if ctx.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":"99"}"#.to_vec())
//! }
//! ```

mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;
pub mod pattern;
pub mod route;

pub use context::Context;
pub use error::{BoxError, Error};
pub use handler::{BoxFuture, Handler, HandlerOutput};
pub use http::{Method, StatusCode};
pub use middleware::{Middleware, MiddlewareChain, Next};
pub use pattern::{Params, PathPattern, PatternError};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
