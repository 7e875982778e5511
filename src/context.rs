//! Per-dispatch handler context.

use std::borrow::Cow;
use std::str::Utf8Error;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::pattern::Params;
use crate::request::Request;

/// What a route handler receives: the request plus the parameters extracted
/// by the matched route.
///
/// Built fresh for every dispatch and never shared between requests.
#[derive(Clone, Debug)]
pub struct Context {
    request: Request,
    params: Params,
}

impl Context {
    pub(crate) fn new(request: Request, params: Params) -> Self {
        Self { request, params }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn method(&self) -> &Method { self.request.method() }
    pub fn uri(&self) -> &Uri { self.request.uri() }
    pub fn path(&self) -> &str { self.request.path() }
    pub fn headers(&self) -> &HeaderMap { self.request.headers() }
    pub fn body(&self) -> &Bytes { self.request.body() }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.request.body())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params { &self.params }

    /// Decoded query-string pairs, in order of appearance.
    pub fn query_pairs(&self) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
        let query = self.request.uri().query().unwrap_or("");
        url::form_urlencoded::parse(query.as_bytes())
    }

    /// The first decoded value of query parameter `name`.
    pub fn query(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(uri: &str, body: &'static [u8], params: Params) -> Context {
        let req = http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Bytes::from_static(body))
            .unwrap();
        Context::new(req.into(), params)
    }

    #[test]
    fn exposes_params_and_request_parts() {
        let params = [("id".to_owned(), "42".to_owned())].into_iter().collect();
        let ctx = context("/users/42", b"hello", params);

        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("missing"), None);
        assert_eq!(ctx.path(), "/users/42");
        assert_eq!(*ctx.method(), Method::POST);
        assert_eq!(ctx.text().unwrap(), "hello");
    }

    #[test]
    fn query_values_are_decoded() {
        let ctx = context("/search?q=hello%20world&tag=a+b&tag=c", b"", Params::new());

        assert_eq!(ctx.query("q").as_deref(), Some("hello world"));
        assert_eq!(ctx.query("tag").as_deref(), Some("a b"));
        assert_eq!(ctx.query("none"), None);
        assert_eq!(ctx.query_pairs().count(), 3);
    }

    #[test]
    fn invalid_utf8_body_is_an_error() {
        let ctx = context("/", &[0xff, 0xfe], Params::new());
        assert!(ctx.text().is_err());
        assert_eq!(ctx.body().len(), 2);
    }
}
