//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. Middleware may read
//! the status and rewrite headers on the way out.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

// ── ContentType ───────────────────────────────────────────────────────────────

/// A `content-type` value for [`ResponseBuilder::bytes`].
///
/// The associated constants cover what handlers usually send; anything else
/// goes through [`ContentType::other`] or [`ResponseBuilder::typed`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContentType(&'static str);

impl ContentType {
    pub const CSS: Self = Self("text/css");
    pub const CSV: Self = Self("text/csv");
    pub const EVENT_STREAM: Self = Self("text/event-stream");
    pub const HTML: Self = Self("text/html; charset=utf-8");
    pub const JSON: Self = Self("application/json");
    pub const OCTET_STREAM: Self = Self("application/octet-stream");
    pub const TEXT: Self = Self("text/plain; charset=utf-8");
    pub const XML: Self = Self("application/xml");

    pub const fn other(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// The plain constructors answer `200 OK`:
///
/// ```rust
/// use trellis::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// Anything else goes through the builder:
///
/// ```rust
/// use trellis::{ContentType, Response, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::XML, b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    body: Vec<u8>,
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    /// The fixed `404 Not Found` produced when no route matches.
    pub fn not_found() -> Self {
        Self::builder().status(StatusCode::NOT_FOUND).text("Not Found")
    }

    /// The fixed `500 Internal Server Error` produced when the chain fails.
    pub fn internal_error() -> Self {
        Self::builder().status(StatusCode::INTERNAL_SERVER_ERROR).text("Internal Server Error")
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing every existing value with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_ascii_lowercase(), value.into()));
    }

    /// Converts into the `http` representation hyper writes to the wire.
    ///
    /// Headers with invalid names or values are dropped with a warning.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut out = http::Response::new(Full::new(Bytes::from(self.body)));
        *out.status_mut() = self.status;
        for (name, value) in self.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    out.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        out
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Builder for responses with a non-200 status or extra headers.
///
/// Every builder ends in exactly one body method, which sets
/// `content-type` to match.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Names are stored lowercase.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_owned()));
        self
    }

    pub fn json(self, body: Vec<u8>) -> Response {
        self.bytes(ContentType::JSON, body)
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::TEXT, body.into().into_bytes())
    }

    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.typed(content_type.as_str(), body)
    }

    /// Body with a content type known only at runtime (e.g. from a MIME table).
    pub fn typed(mut self, content_type: &str, body: Vec<u8>) -> Response {
        self.headers.insert(0, ("content-type".to_owned(), content_type.to_owned()));
        self.finish(body)
    }

    /// `204`-style response: no body and no `content-type`.
    pub fn no_body(self) -> Response {
        self.finish(Vec::new())
    }

    fn finish(self, body: Vec<u8>) -> Response {
        Response { body, headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Values a handler can return as a successful response.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// A bare status with an empty body.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_header_replaces_existing_values() {
        let mut res = Response::builder()
            .header("X-Trace", "a")
            .header("x-trace", "b")
            .text("ok");

        res.set_header("X-TRACE", "c");

        assert_eq!(res.header("x-trace"), Some("c"));
        assert_eq!(res.headers().iter().filter(|(k, _)| k == "x-trace").count(), 1);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn fixed_responses_have_plain_text_bodies() {
        let res = Response::not_found();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body(), b"Not Found");

        let res = Response::internal_error();
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body(), b"Internal Server Error");
    }

    #[test]
    fn into_http_keeps_status_headers_and_drops_invalid_ones() {
        let mut res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/9")
            .json(b"{}".to_vec());
        res.set_header("bad header", "x");

        let http = res.into_http();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers()["location"], "/users/9");
        assert_eq!(http.headers()["content-type"], "application/json");
        assert_eq!(http.headers().len(), 2);
    }
}
