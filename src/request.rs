//! Incoming HTTP request type.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request.
///
/// Immutable once built. Cloning is one `Arc` increment, so every middleware
/// and the final handler can hold the same request without copying the body.
#[derive(Clone, Debug)]
pub struct Request {
    inner: Arc<Parts>,
}

#[derive(Debug)]
struct Parts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self { inner: Arc::new(Parts { method, uri, headers, body }) }
    }

    pub fn method(&self) -> &Method { &self.inner.method }
    pub fn uri(&self) -> &Uri { &self.inner.uri }
    pub fn path(&self) -> &str { self.inner.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.inner.headers }
    pub fn body(&self) -> &Bytes { &self.inner.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name)?.to_str().ok()
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req: Request = http::Request::builder()
            .uri("/users/1?full=true")
            .header("X-Request-Id", "abc")
            .body(Bytes::new())
            .unwrap()
            .into();

        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(req.header("missing"), None);
        assert_eq!(req.path(), "/users/1");
        assert_eq!(*req.method(), Method::GET);
    }
}
