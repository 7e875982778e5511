//! Per-method route storage and first-match lookup.
//!
//! Routes for one method are tested in registration order and the first
//! structural match wins. Overlapping templates are allowed: order is the
//! only disambiguation, so `/items/:id` registered before `/items/latest`
//! shadows it.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::handler::BoxedHandler;
use crate::pattern::{Params, PathPattern, PatternError};

/// One registered route.
pub struct RouteEntry {
    pattern: PathPattern,
    handler: BoxedHandler,
}

impl RouteEntry {
    pub fn pattern(&self) -> &PathPattern { &self.pattern }
}

/// The outcome of a successful lookup.
pub struct RouteMatch {
    pub(crate) handler: BoxedHandler,
    pub params: Params,
}

/// Every registered route, grouped by method.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self { Self::default() }

    /// Compiles `template` and appends it to `method`'s list.
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: BoxedHandler,
    ) -> Result<(), PatternError> {
        let pattern = PathPattern::compile(template)?;
        self.routes
            .entry(method)
            .or_default()
            .push(RouteEntry { pattern, handler });
        Ok(())
    }

    /// Returns the first route for `method` whose pattern matches `path`.
    ///
    /// Methods with no registered routes yield `None`.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.get(method)?.iter().find_map(|entry| {
            let params = entry.pattern.matches(path)?;
            Some(RouteMatch { handler: Arc::clone(&entry.handler), params })
        })
    }

    /// Routes registered for `method`, in registration order.
    pub fn entries(&self, method: &Method) -> &[RouteEntry] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or_default()
    }
}
