//! Access logging through `tracing`.
//!
//! One event on the way in, one on the way out:
//!
//! ```text
//! → GET /users/42
//! ← GET /users/42 200 1.84ms
//! ```
//!
//! A failure from downstream is logged as `⨯ GET /users/42 ERROR` and then
//! propagated unchanged, so the router still answers `500`.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Configuration for [`Logger`].
#[derive(Clone, Copy, Debug)]
pub struct LoggerOptions {
    enabled: bool,
    show_duration: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self { enabled: true, show_duration: true }
    }
}

impl LoggerOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn show_duration(mut self, show: bool) -> Self {
        self.show_duration = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Logger {
    options: LoggerOptions,
}

impl Logger {
    pub fn new(options: LoggerOptions) -> Self {
        Self { options }
    }

    fn line(&self, arrow: &str, req: &Request, outcome: &str, elapsed: Duration) -> String {
        let mut line = format!("{arrow} {} {}", req.method(), req.path());
        if !outcome.is_empty() {
            line.push(' ');
            line.push_str(outcome);
        }
        if self.options.show_duration {
            line.push(' ');
            line.push_str(&format_duration(elapsed));
        }
        line
    }
}

impl Middleware for Logger {
    fn call<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            if !self.options.enabled {
                return next.run().await;
            }

            info!(method = %req.method(), path = %req.path(), "→ {} {}", req.method(), req.path());
            let start = Instant::now();

            match next.run().await {
                Ok(res) => {
                    let status = res.status_code();
                    let line = self.line("←", &req, status.as_str(), start.elapsed());
                    info!(status = status.as_u16(), "{line}");
                    Ok(res)
                }
                Err(e) => {
                    let line = self.line("⨯", &req, "ERROR", start.elapsed());
                    error!(error = %e, "{line}");
                    Err(e)
                }
            }
        })
    }
}

/// `12.34ms` below one second, `1.23s` above.
fn format_duration(elapsed: Duration) -> String {
    let ms = elapsed.as_secs_f64() * 1000.0;
    if ms > 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{ms:.2}ms")
    }
}
