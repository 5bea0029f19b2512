//! Logging setup and credential redaction

use std::fmt;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// Level comes from `RUST_LOG` (default `info`). This function can only be
/// called once.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt_layer::layer().json().with_target(true))
            .init();
    } else {
        registry.with(fmt_layer::layer().with_target(true)).init();
    }
}

/// Redacted bot token for logs and summaries
///
/// Only the first 6 characters are shown, the rest is replaced with `***`.
#[derive(Clone, Debug)]
pub struct SensitiveToken<'a> {
    inner: &'a str,
}

impl<'a> SensitiveToken<'a> {
    /// # Example
    /// ```
    /// use chain_stats_bot::logging::SensitiveToken;
    ///
    /// let token = "MTA4NjQ1.GxYz12.abcdefghijkl";
    /// assert_eq!(SensitiveToken::new(token).to_string(), "MTA4Nj***");
    /// ```
    pub fn new(token: &'a str) -> Self {
        Self { inner: token }
    }
}

impl<'a> fmt::Display for SensitiveToken<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible_len = 6;
        // Short tokens are hidden entirely
        if self.inner.chars().count() <= visible_len * 2 {
            return write!(f, "***");
        }
        let end = self
            .inner
            .char_indices()
            .nth(visible_len)
            .map_or(self.inner.len(), |(idx, _)| idx);
        write!(f, "{}***", &self.inner[..end])
    }
}
