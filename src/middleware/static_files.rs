//! Static file serving.
//!
//! Serves files under a root directory for request paths beneath an optional
//! URL prefix. Anything it cannot serve falls through to the next stage, so
//! routes registered on the same router keep working.
//!
//! ```rust
//! use trellis::Router;
//! use trellis::middleware::{Static, StaticOptions};
//!
//! let app = Router::new().middleware(Static::new(
//!     StaticOptions::default().dir("./public").prefix("/assets"),
//! ));
//! ```
//!
//! Paths containing a `..` component are never served.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::{ContentType, Response};

/// Extension → MIME type table used when no custom entry matches.
const DEFAULT_MIME_TYPES: &[(&str, &str)] = &[
    // Text
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("txt", "text/plain"),
    ("xml", "text/xml"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    // Other
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
];

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Configuration for [`Static`].
#[derive(Clone, Debug)]
pub struct StaticOptions {
    dir: PathBuf,
    prefix: String,
    index: String,
    mime_types: HashMap<String, String>,
    listing: bool,
    spa: bool,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public"),
            prefix: String::new(),
            index: "index.html".to_owned(),
            mime_types: HashMap::new(),
            listing: false,
            spa: false,
        }
    }
}

impl StaticOptions {
    /// Root directory files are served from. Default `public`.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// URL prefix, e.g. `/assets`. Requests outside it pass through.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// File served for directory requests. Default `index.html`.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Adds or overrides the MIME type for an extension.
    pub fn mime_type(mut self, ext: impl Into<String>, mime: impl Into<String>) -> Self {
        self.mime_types.insert(ext.into().to_ascii_lowercase(), mime.into());
        self
    }

    /// Render an HTML listing for directories without an index file.
    pub fn listing(mut self, enabled: bool) -> Self {
        self.listing = enabled;
        self
    }

    /// Serve the root index file for paths that do not exist.
    pub fn spa(mut self, enabled: bool) -> Self {
        self.spa = enabled;
        self
    }
}

/// Static file middleware.
#[derive(Clone, Debug, Default)]
pub struct Static {
    options: StaticOptions,
}

impl Static {
    pub fn new(options: StaticOptions) -> Self {
        Self { options }
    }

    /// Maps a request path onto a path relative to the root directory.
    ///
    /// `None` means the request is not ours: outside the prefix, not valid
    /// percent-encoding, or trying to climb out of the root.
    fn relative_path(&self, path: &str) -> Option<String> {
        let decoded = urlencoding::decode(path).ok()?;
        let rest = decoded.strip_prefix(self.options.prefix.as_str())?;
        let rest = rest.trim_start_matches('/');

        let escapes = Path::new(rest).components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes {
            warn!(path, "refusing path outside the static root");
            return None;
        }
        Some(rest.to_owned())
    }

    fn mime_type(&self, file_name: &str) -> &str {
        let ext = file_name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if let Some(custom) = self.options.mime_types.get(&ext) {
            return custom;
        }
        DEFAULT_MIME_TYPES.iter()
            .find(|(e, _)| *e == ext)
            .map_or(FALLBACK_MIME_TYPE, |&(_, mime)| mime)
    }

    async fn file(&self, path: &Path, name: &str) -> Option<Response> {
        match tokio::fs::read(path).await {
            Ok(body) => Some(Response::builder().typed(self.mime_type(name), body)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "static file unreadable");
                None
            }
        }
    }

    async fn serve(&self, relative: &str) -> Option<Response> {
        let full = self.options.dir.join(relative);

        let Ok(meta) = tokio::fs::metadata(&full).await else {
            if self.options.spa {
                let index = self.options.dir.join(&self.options.index);
                return self.file(&index, &self.options.index).await;
            }
            return None;
        };

        if meta.is_file() {
            let name = full.file_name()?.to_string_lossy().into_owned();
            return self.file(&full, &name).await;
        }

        if meta.is_dir() {
            let index = full.join(&self.options.index);
            if tokio::fs::metadata(&index).await.is_ok_and(|m| m.is_file()) {
                return self.file(&index, &self.options.index).await;
            }
            if self.options.listing {
                return listing(&full, relative).await;
            }
        }
        None
    }
}

impl Middleware for Static {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let Some(relative) = self.relative_path(req.path()) else {
                return next.run().await;
            };
            match self.serve(&relative).await {
                Some(res) => Ok(res),
                None => next.run().await,
            }
        })
    }
}

async fn listing(dir: &Path, relative: &str) -> Option<Response> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    names.sort();

    let title = format!("/{relative}");
    let body = render_listing(&title, &names);
    Some(Response::builder().bytes(ContentType::HTML, body.into_bytes()))
}

fn render_listing(title: &str, names: &[(String, bool)]) -> String {
    let title = escape_html(title);
    let mut items = String::new();
    if title != "/" {
        items.push_str("<li><a href=\"../\">../</a></li>\n");
    }
    for (name, is_dir) in names {
        let name = escape_html(name);
        let slash = if *is_dir { "/" } else { "" };
        items.push_str(&format!("<li><a href=\"./{name}{slash}\">{name}{slash}</a></li>\n"));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Directory: {title}</title></head>\n\
         <body>\n<h1>Directory: {title}</h1>\n<ul class=\"list\">\n{items}</ul>\n</body>\n</html>\n"
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::{Context, Router};

    fn request(path: &str) -> Request {
        http::Request::builder().uri(path).body(Bytes::new()).unwrap().into()
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("data.bin"), [0u8, 1, 2]).unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("guide.txt"), "read me").unwrap();
        dir
    }

    fn app(options: StaticOptions) -> Router {
        Router::new()
            .middleware(Static::new(options))
            .get("/api/ping", |_ctx: Context| async { "pong" })
    }

    #[tokio::test]
    async fn serves_files_with_mime_types() {
        let dir = site();
        let app = app(StaticOptions::default().dir(dir.path()));

        let res = app.run(request("/app.js")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("text/javascript"));
        assert_eq!(res.body(), b"console.log(1)");

        let res = app.run(request("/data.bin")).await;
        assert_eq!(res.header("content-type"), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn directories_serve_their_index() {
        let dir = site();
        let res = app(StaticOptions::default().dir(dir.path())).run(request("/")).await;
        assert_eq!(res.header("content-type"), Some("text/html"));
        assert_eq!(res.body(), b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn misses_fall_through_to_routes() {
        let dir = site();
        let app = app(StaticOptions::default().dir(dir.path()));

        assert_eq!(app.run(request("/api/ping")).await.body(), b"pong");
        assert_eq!(app.run(request("/nope.css")).await.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(app.run(request("/docs")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn prefix_scopes_and_strips() {
        let dir = site();
        let app = app(StaticOptions::default().dir(dir.path()).prefix("/static"));

        assert_eq!(app.run(request("/static/docs/guide.txt")).await.body(), b"read me");
        assert_eq!(app.run(request("/app.js")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn parent_components_are_refused() {
        let dir = site();
        let app = app(StaticOptions::default().dir(dir.path().join("docs")));

        let res = app.run(request("/../index.html")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        let res = app.run(request("/%2e%2e/index.html")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn percent_encoded_names_are_decoded() {
        let dir = site();
        fs::write(dir.path().join("hello world.txt"), "spaced").unwrap();

        let res = app(StaticOptions::default().dir(dir.path()))
            .run(request("/hello%20world.txt"))
            .await;
        assert_eq!(res.body(), b"spaced");
    }

    #[tokio::test]
    async fn spa_mode_serves_root_index_for_missing_paths() {
        let dir = site();
        let res = app(StaticOptions::default().dir(dir.path()).spa(true))
            .run(request("/dashboard/settings"))
            .await;
        assert_eq!(res.body(), b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn listing_renders_directory_entries() {
        let dir = site();
        let res = app(StaticOptions::default().dir(dir.path()).listing(true))
            .run(request("/docs"))
            .await;

        let body = String::from_utf8(res.body().to_vec()).unwrap();
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
        assert!(body.contains("Directory: /docs"));
        assert!(body.contains(r#"<a href="./guide.txt">guide.txt</a>"#));
        assert!(body.contains(r#"<a href="../">../</a>"#));
    }

    #[test]
    fn custom_mime_types_override_defaults() {
        let s = Static::new(StaticOptions::default().mime_type("JS", "application/javascript"));
        assert_eq!(s.mime_type("app.js"), "application/javascript");
        assert_eq!(s.mime_type("logo.PNG"), "image/png");
        assert_eq!(s.mime_type("README"), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn listing_escapes_names() {
        let html = render_listing("/", &[("<b>.txt".to_owned(), false)]);
        assert!(html.contains("&lt;b&gt;.txt"));
        assert!(!html.contains("../"));
    }
}
