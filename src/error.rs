//! Unified error type.

use std::any::Any;

use thiserror::Error;

/// A boxed error raised by a handler or middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by trellis's fallible operations.
///
/// Application-level outcomes (404, 401, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type covers
/// infrastructure failures and the unexpected failures that unwind through
/// the middleware chain to [`Router::run`](crate::Router::run).
#[derive(Debug, Error)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The server address could not be parsed.
    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    /// A handler or middleware returned an error.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A handler or middleware panicked.
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl Error {
    /// Wraps any error as a handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_owned()
        };
        Self::Panic(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_keep_their_message() {
        let err = Error::from_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "handler panicked: boom");

        let err = Error::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(err.to_string(), "handler panicked: kaboom");

        let err = Error::from_panic(Box::new(42_u8));
        assert_eq!(err.to_string(), "handler panicked: unknown panic payload");
    }

    #[test]
    fn handler_errors_expose_their_source() {
        let err = Error::handler("database unavailable");
        assert_eq!(err.to_string(), "handler failed: database unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }
}
