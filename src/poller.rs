// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bounded polling for flaky or asynchronous remote operations.
//!
//! The DNS control-plane API intermittently answers with 5xx errors, rejects
//! writes with 409 while another change to the same zone is in flight, and
//! completes zone deletes asynchronously. This module drives such an
//! operation from *pending* to *done* or *failed* within a fixed deadline.
//!
//! # Contract
//!
//! - Every attempt returns a [`PollOutcome`]: `Pending`, `Done(value)` or `Failed(error)`.
//! - `Pending` sleeps `min_interval` and tries again.
//! - `Done` and `Failed` are terminal and returned immediately.
//! - When the next attempt would start at or after `timeout`, polling stops
//!   with a [`TimeoutError`]; no further remote call is made.
//!
//! Classification looks at the latest outcome only, so the poller carries no
//! state beyond the attempt counter and the start instant.
//!
//! # Example
//!
//! ```rust,no_run
//! use zonekeeper::poller::{poll, PollConfig, PollOutcome};
//!
//! # async fn example() {
//! let mut calls = 0;
//! let result: Result<u32, _> = poll(&PollConfig::default(), "count to three", || {
//!     calls += 1;
//!     let outcome = if calls < 3 {
//!         PollOutcome::<u32, String>::Pending("not yet".to_string())
//!     } else {
//!         PollOutcome::Done(calls)
//!     };
//!     async move { outcome }
//! })
//! .await;
//! # let _ = result;
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::api::ApiResponse;
use crate::constants::{DEFAULT_POLL_MIN_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS};
use crate::errors::{ApiError, DnsError, TimeoutError};
use crate::http_errors::{classify_status, StatusClass};
use crate::metrics;

/// Result of a single attempt of a polled operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T, E> {
    /// Transient condition; try again after the poll interval. Carries a
    /// description of what was observed, used for logs and the timeout error.
    Pending(String),
    /// Terminal success
    Done(T),
    /// Terminal failure
    Failed(E),
}

/// Why a polled operation did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    /// An attempt returned a terminal failure
    Failed(E),
    /// The deadline elapsed while attempts were still pending
    TimedOut(TimeoutError),
}

impl<E> PollError<E> {
    /// Convert into a [`DnsError`], wrapping a terminal failure with `wrap`.
    pub fn into_dns_error(self, wrap: impl FnOnce(E) -> DnsError) -> DnsError {
        match self {
            Self::Failed(e) => wrap(e),
            Self::TimedOut(timeout) => DnsError::Timeout(timeout),
        }
    }
}

/// Timing parameters of a polled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Upper bound on total time spent polling
    pub timeout: Duration,
    /// Sleep between two attempts
    pub min_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            min_interval: Duration::from_secs(DEFAULT_POLL_MIN_INTERVAL_SECS),
        }
    }
}

impl PollConfig {
    /// Create a poll configuration.
    #[must_use]
    pub fn new(timeout: Duration, min_interval: Duration) -> Self {
        Self {
            timeout,
            min_interval,
        }
    }
}

/// Classify the outcome of one API call for the poller.
///
/// # Precedence
///
/// 1. A status in the retryable set (409, 500, 502, 503, 504) is `Pending`,
///    whether the call came back as `Ok` or `Err`.
/// 2. Any other error is `Failed`.
/// 3. An `Ok` response with a non-2xx status is `Failed`.
/// 4. Otherwise `Done` with the response body.
pub fn classify_response<T>(result: Result<ApiResponse<T>, ApiError>) -> PollOutcome<T, ApiError> {
    match result {
        Ok(response) => match classify_status(response.status) {
            StatusClass::Success => PollOutcome::Done(response.body),
            StatusClass::Retryable => {
                PollOutcome::Pending(format!("HTTP {}", response.status.as_u16()))
            }
            StatusClass::NotFound | StatusClass::Failure => PollOutcome::Failed(
                ApiError::from_status(response.status, "unexpected status without error body"),
            ),
        },
        Err(err) if err.is_retryable() => PollOutcome::Pending(err.to_string()),
        Err(err) => PollOutcome::Failed(err),
    }
}

/// Drive `operation` until it settles or `config.timeout` elapses.
///
/// # Arguments
///
/// * `config` - Timeout and poll interval
/// * `operation_name` - Human-readable name for logging (e.g., "delete zone example.com")
/// * `operation` - Performs one remote call and classifies it
///
/// # Errors
///
/// - [`PollError::Failed`] with the error of the first terminal failure
/// - [`PollError::TimedOut`] when the deadline elapses while still pending
pub async fn poll<T, E, F, Fut>(
    config: &PollConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollOutcome<T, E>>,
    E: std::fmt::Display,
{
    let start_time = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            PollOutcome::Done(value) => {
                metrics::record_poll_attempt("done");
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "Operation settled after retries"
                    );
                } else {
                    debug!(operation = operation_name, "Operation settled");
                }
                return Ok(value);
            }
            PollOutcome::Failed(e) => {
                metrics::record_poll_attempt("failed");
                error!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %e,
                    "Non-retryable outcome, failing immediately"
                );
                return Err(PollError::Failed(e));
            }
            PollOutcome::Pending(observed) => {
                metrics::record_poll_attempt("pending");
                let elapsed = start_time.elapsed();

                if elapsed + config.min_interval >= config.timeout {
                    metrics::record_poll_timeout();
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?elapsed,
                        observed = %observed,
                        "Poll deadline exceeded, giving up"
                    );
                    return Err(PollError::TimedOut(TimeoutError {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                        elapsed,
                        last_outcome: observed,
                    }));
                }

                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    retry_after = ?config.min_interval,
                    observed = %observed,
                    "Operation pending, will retry"
                );
                tokio::time::sleep(config.min_interval).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod poller_tests;
