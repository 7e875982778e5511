//! Bearer-token authentication.
//!
//! ```rust
//! use trellis::Router;
//! use trellis::middleware::{AuthOptions, BearerAuth, ExcludePath};
//!
//! let auth = BearerAuth::new(
//!     AuthOptions::default()
//!         .exclude(ExcludePath::exact("/login"))
//!         .validate(|token| async move { token == "s3cret" }),
//! );
//! let app = Router::new().middleware(auth);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Why a request was rejected.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
}

type Validator = Arc<dyn Fn(String) -> BoxFuture<'static, bool> + Send + Sync>;
type ErrorResponder = Arc<dyn Fn(AuthError) -> Response + Send + Sync>;

/// A path that skips authentication.
#[derive(Clone, Debug)]
pub enum ExcludePath {
    Exact(String),
    Pattern(Regex),
}

impl ExcludePath {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    pub fn pattern(re: Regex) -> Self {
        Self::Pattern(re)
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => p == path,
            Self::Pattern(re) => re.is_match(path),
        }
    }
}

/// Configuration for [`BearerAuth`].
#[derive(Clone)]
pub struct AuthOptions {
    header: String,
    scheme: String,
    exclude: Vec<ExcludePath>,
    validate: Validator,
    on_error: ErrorResponder,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            header: "authorization".to_owned(),
            scheme: "Bearer".to_owned(),
            exclude: Vec::new(),
            validate: Arc::new(|_token: String| -> BoxFuture<'static, bool> {
                Box::pin(async { true })
            }),
            on_error: Arc::new(|_err: AuthError| {
                Response::builder().status(StatusCode::UNAUTHORIZED).text("Unauthorized")
            }),
        }
    }
}

impl AuthOptions {
    /// Header carrying the credentials. Default `authorization`.
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.header = name.into();
        self
    }

    /// Scheme preceding the token. Default `Bearer`.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn exclude(mut self, path: ExcludePath) -> Self {
        self.exclude.push(path);
        self
    }

    /// Token check. The default accepts every well-formed token.
    pub fn validate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.validate = Arc::new(move |token: String| -> BoxFuture<'static, bool> {
            Box::pin(f(token))
        });
        self
    }

    /// Builds the rejection response. The default is `401 Unauthorized`.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(AuthError) -> Response + Send + Sync + 'static,
    {
        self.on_error = Arc::new(f);
        self
    }
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOptions")
            .field("header", &self.header)
            .field("scheme", &self.scheme)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

/// Rejects requests that lack a valid `Authorization: Bearer <token>` header.
#[derive(Clone, Debug, Default)]
pub struct BearerAuth {
    options: AuthOptions,
}

impl BearerAuth {
    pub fn new(options: AuthOptions) -> Self {
        Self { options }
    }

    async fn check(&self, req: &Request) -> Result<(), AuthError> {
        let token = req.header(&self.options.header)
            .and_then(|value| extract_token(value, &self.options.scheme))
            .ok_or(AuthError::MissingToken)?;

        if (self.options.validate)(token.to_owned()).await {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl Middleware for BearerAuth {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            if self.options.exclude.iter().any(|p| p.matches(req.path())) {
                return next.run().await;
            }

            match self.check(&req).await {
                Ok(()) => next.run().await,
                Err(e) => {
                    debug!(path = %req.path(), reason = %e, "authentication rejected");
                    Ok((self.options.on_error)(e))
                }
            }
        })
    }
}

/// `"<scheme> <token>"` → `token`. Extra space-separated parts are ignored.
fn extract_token<'h>(value: &'h str, scheme: &str) -> Option<&'h str> {
    let mut parts = value.split(' ');
    let (Some(found), Some(token)) = (parts.next(), parts.next()) else {
        return None;
    };
    (found == scheme && !token.is_empty()).then_some(token)
}
