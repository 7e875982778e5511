//! Cross-Origin Resource Sharing.
//!
//! Answers `OPTIONS` preflight requests directly with `204 No Content` and
//! adds `Access-Control-*` headers to every other response on its way out.
//!
//! ```rust
//! use trellis::Router;
//! use trellis::middleware::{AllowOrigin, Cors, CorsOptions};
//!
//! let cors = Cors::new(
//!     CorsOptions::default()
//!         .origin(AllowOrigin::list(["https://app.example.com"]))
//!         .credentials(true),
//! );
//! let app = Router::new().middleware(cors);
//! ```

use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// CORS header names.
pub mod headers {
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    pub const MAX_AGE: &str = "access-control-max-age";
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    pub const ORIGIN: &str = "origin";
}

/// Which origins may read responses.
#[derive(Clone)]
pub enum AllowOrigin {
    /// `*`, every origin.
    Any,
    /// Exactly one origin.
    Exact(String),
    /// Any origin in the list.
    List(Vec<String>),
    /// Origins accepted by a predicate.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl AllowOrigin {
    pub fn exact(origin: impl Into<String>) -> Self {
        Self::Exact(origin.into())
    }

    pub fn list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(origins.into_iter().map(Into::into).collect())
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(allowed) => allowed == origin,
            Self::List(allowed) => allowed.iter().any(|o| o == origin),
            Self::Predicate(f) => f(origin),
        }
    }
}

impl fmt::Debug for AllowOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Exact(o) => f.debug_tuple("Exact").field(o).finish(),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Configuration for [`Cors`].
#[derive(Clone, Debug)]
pub struct CorsOptions {
    origin: AllowOrigin,
    methods: Vec<Method>,
    allowed_headers: Vec<String>,
    exposed_headers: Vec<String>,
    credentials: bool,
    max_age: u64,
    preflight: bool,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            origin: AllowOrigin::Any,
            methods: vec![
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::PATCH,
                Method::POST,
                Method::DELETE,
            ],
            allowed_headers: Vec::new(),
            exposed_headers: Vec::new(),
            credentials: false,
            max_age: 86_400, // 24 hours
            preflight: true,
        }
    }
}

impl CorsOptions {
    pub fn origin(mut self, origin: AllowOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Headers a preflight may allow. When empty, the preflight echoes the
    /// request's `access-control-request-headers`.
    pub fn allowed_headers<S: Into<String>>(mut self, headers: impl IntoIterator<Item = S>) -> Self {
        self.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn exposed_headers<S: Into<String>>(mut self, headers: impl IntoIterator<Item = S>) -> Self {
        self.exposed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn credentials(mut self, allow: bool) -> Self {
        self.credentials = allow;
        self
    }

    /// Preflight cache lifetime in seconds. `0` omits the header.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = seconds;
        self
    }

    /// Whether `OPTIONS` requests are answered here instead of routed.
    pub fn preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }
}

/// CORS middleware. Register it first so preflights skip everything else.
#[derive(Clone, Debug, Default)]
pub struct Cors {
    options: CorsOptions,
}

impl Cors {
    pub fn new(options: CorsOptions) -> Self {
        Self { options }
    }

    /// Headers every response to this origin carries.
    fn base_headers(&self, origin: &str) -> Vec<(&'static str, String)> {
        let o = &self.options;
        let mut out = Vec::new();

        if o.origin.allows(origin) {
            let value = match &o.origin {
                AllowOrigin::Any if o.credentials => origin.to_owned(),
                AllowOrigin::Any => "*".to_owned(),
                AllowOrigin::Exact(allowed) => allowed.clone(),
                _ => origin.to_owned(),
            };
            out.push((headers::ALLOW_ORIGIN, value));
        }

        if o.credentials {
            out.push((headers::ALLOW_CREDENTIALS, "true".to_owned()));
        }
        out
    }

    fn preflight(&self, req: &Request, mut out: Vec<(&'static str, String)>) -> Response {
        let o = &self.options;
        let methods: Vec<&str> = o.methods.iter().map(Method::as_str).collect();
        out.push((headers::ALLOW_METHODS, methods.join(", ")));

        if !o.allowed_headers.is_empty() {
            out.push((headers::ALLOW_HEADERS, o.allowed_headers.join(", ")));
        } else if let Some(requested) = req.header(headers::REQUEST_HEADERS) {
            out.push((headers::ALLOW_HEADERS, requested.to_owned()));
        }

        if !o.exposed_headers.is_empty() {
            out.push((headers::EXPOSE_HEADERS, o.exposed_headers.join(", ")));
        }

        if o.max_age > 0 {
            out.push((headers::MAX_AGE, o.max_age.to_string()));
        }

        let mut res = Response::builder().status(StatusCode::NO_CONTENT).no_body();
        for (name, value) in out {
            res.set_header(name, value);
        }
        res
    }
}

impl Middleware for Cors {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let origin = req.header(headers::ORIGIN).unwrap_or("");
            let out = self.base_headers(origin);

            if self.options.preflight && *req.method() == Method::OPTIONS {
                return Ok(self.preflight(&req, out));
            }

            let mut res = next.run().await?;
            for (name, value) in out {
                res.set_header(name, value);
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::{Context, Router};

    fn request(method: Method, origin: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri("/data");
        if let Some(origin) = origin {
            builder = builder.header("origin", origin);
        }
        builder.body(Bytes::new()).unwrap().into()
    }

    fn app(options: CorsOptions) -> Router {
        Router::new()
            .middleware(Cors::new(options))
            .get("/data", |_ctx: Context| async { "payload" })
    }

    #[tokio::test]
    async fn wildcard_origin_by_default() {
        let res = app(CorsOptions::default())
            .run(request(Method::GET, Some("https://a.example")))
            .await;

        assert_eq!(res.body(), b"payload");
        assert_eq!(res.header(headers::ALLOW_ORIGIN), Some("*"));
        assert_eq!(res.header(headers::ALLOW_CREDENTIALS), None);
    }

    #[tokio::test]
    async fn wildcard_with_credentials_reflects_origin() {
        let res = app(CorsOptions::default().credentials(true))
            .run(request(Method::GET, Some("https://a.example")))
            .await;

        assert_eq!(res.header(headers::ALLOW_ORIGIN), Some("https://a.example"));
        assert_eq!(res.header(headers::ALLOW_CREDENTIALS), Some("true"));
    }

    #[tokio::test]
    async fn disallowed_origin_gets_no_allow_origin() {
        let options = CorsOptions::default().origin(AllowOrigin::list(["https://ok.example"]));
        let app = app(options);

        let res = app.run(request(Method::GET, Some("https://evil.example"))).await;
        assert_eq!(res.header(headers::ALLOW_ORIGIN), None);
        assert_eq!(res.body(), b"payload");

        let res = app.run(request(Method::GET, Some("https://ok.example"))).await;
        assert_eq!(res.header(headers::ALLOW_ORIGIN), Some("https://ok.example"));
    }

    #[tokio::test]
    async fn predicate_origin() {
        let options = CorsOptions::default()
            .origin(AllowOrigin::predicate(|o| o.ends_with(".example")));
        let res = app(options).run(request(Method::GET, Some("https://x.example"))).await;
        assert_eq!(res.header(headers::ALLOW_ORIGIN), Some("https://x.example"));
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_no_content() {
        let req: Request = http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/anything")
            .header("origin", "https://a.example")
            .header("access-control-request-headers", "x-custom")
            .body(Bytes::new())
            .unwrap()
            .into();

        let res = app(CorsOptions::default().exposed_headers(["x-total"])).run(req).await;

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert_eq!(
            res.header(headers::ALLOW_METHODS),
            Some("GET, HEAD, PUT, PATCH, POST, DELETE"),
        );
        assert_eq!(res.header(headers::ALLOW_HEADERS), Some("x-custom"));
        assert_eq!(res.header(headers::EXPOSE_HEADERS), Some("x-total"));
        assert_eq!(res.header(headers::MAX_AGE), Some("86400"));
    }

    #[tokio::test]
    async fn preflight_prefers_configured_headers_and_honours_zero_max_age() {
        let options = CorsOptions::default()
            .allowed_headers(["content-type", "authorization"])
            .max_age(0);
        let res = app(options).run(request(Method::OPTIONS, None)).await;

        assert_eq!(res.header(headers::ALLOW_HEADERS), Some("content-type, authorization"));
        assert_eq!(res.header(headers::MAX_AGE), None);
    }

    #[tokio::test]
    async fn preflight_disabled_routes_options_normally() {
        let res = app(CorsOptions::default().preflight(false))
            .run(request(Method::OPTIONS, Some("https://a.example")))
            .await;

        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.header(headers::ALLOW_ORIGIN), Some("*"));
    }
}
