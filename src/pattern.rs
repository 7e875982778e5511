//! Path templates and parameter extraction.
//!
//! A template is a route path where `:name` marks a parameter:
//!
//! ```text
//! /users/:id/posts/:postId
//! ```
//!
//! Each parameter captures one or more characters up to the next `/`.
//! Everything else is literal and must match byte-for-byte. Matching is
//! anchored at both ends, so `/users/:id` does not match `/users/1/profile`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// `:` followed by an identifier that starts with a letter.
static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([a-zA-Z][a-zA-Z0-9]*)").expect("parameter marker regex is valid")
});

/// Why a template was rejected.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("duplicate parameter `{0}`")]
    DuplicateParam(String),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// One piece of a compiled template, in declaration order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template. Immutable once built.
#[derive(Clone, Debug)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    names: Vec<String>,
    matcher: Regex,
}

impl PathPattern {
    /// Compiles `template` into an anchored matcher.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut source = String::from("^");
        let mut cursor = 0;

        for caps in PARAM.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            if whole.start() > cursor {
                let literal = &template[cursor..whole.start()];
                source.push_str(&regex::escape(literal));
                segments.push(Segment::Literal(literal.to_owned()));
            }

            let name = name.as_str();
            if names.iter().any(|n| n == name) {
                return Err(PatternError::DuplicateParam(name.to_owned()));
            }
            names.push(name.to_owned());
            segments.push(Segment::Param(name.to_owned()));
            source.push_str("([^/]+)");
            cursor = whole.end();
        }

        if cursor < template.len() {
            let literal = &template[cursor..];
            source.push_str(&regex::escape(literal));
            segments.push(Segment::Literal(literal.to_owned()));
        }
        source.push('$');

        Ok(Self {
            template: template.to_owned(),
            segments,
            names,
            matcher: Regex::new(&source)?,
        })
    }

    /// Tests `path` against the template and extracts its parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;
        let params = self.names.iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, value)| Some((name.clone(), value?.as_str().to_owned())))
            .collect();
        Some(params)
    }

    pub fn template(&self) -> &str { &self.template }
    pub fn segments(&self) -> &[Segment] { &self.segments }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &[String] { &self.names }
}

/// Extracted route parameters, kept in declaration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params {
    inner: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize { self.inner.len() }
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}
