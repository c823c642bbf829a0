// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Client and poller configuration.
//!
//! Values come from CLI flags, falling back to environment variables and then
//! to the defaults in [`crate::constants`]. The CLI layer resolves flags and
//! environment through `clap`; this module owns validation and the defaults
//! so library users can build a configuration without the binary.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_POLL_MIN_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS,
};
use crate::poller::PollConfig;

/// Connection settings for the DNS control-plane API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL (scheme and host, optionally a path prefix)
    pub api_url: Url,
    /// Bearer token, if the API requires one
    pub api_token: Option<String>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a configuration from a base URL string.
    ///
    /// A URL without scheme is treated as `https://`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot carry a path.
    pub fn new(api_url: &str, api_token: Option<String>) -> Result<Self> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            api_token: api_token.filter(|t| !t.is_empty()),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Parse and normalize the API base URL.
///
/// # Errors
///
/// Returns an error if the URL is empty, unparsable or cannot carry a path.
pub fn parse_api_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("API URL cannot be empty");
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).with_context(|| format!("invalid API URL '{raw}'"))?;
    if url.cannot_be_a_base() {
        bail!("API URL '{raw}' cannot carry a path");
    }
    Ok(url)
}

/// Build a poll configuration from optional overrides in seconds.
///
/// # Errors
///
/// Returns an error if the interval is zero or not shorter than the timeout.
pub fn poll_config(timeout_secs: Option<u64>, interval_secs: Option<u64>) -> Result<PollConfig> {
    let timeout = timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
    let interval = interval_secs.unwrap_or(DEFAULT_POLL_MIN_INTERVAL_SECS);

    if interval == 0 {
        bail!("poll interval must be at least one second");
    }
    if interval >= timeout {
        bail!("poll interval ({interval}s) must be shorter than the poll timeout ({timeout}s)");
    }

    Ok(PollConfig::new(
        Duration::from_secs(timeout),
        Duration::from_secs(interval),
    ))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
