// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP status classification for the DNS control-plane API.
//!
//! The bounded poller and the lifecycle managers never inspect raw status codes
//! directly; they go through [`classify_status`] so the retryable set is
//! defined in exactly one place.
//!
//! # Usage
//!
//! ```rust
//! use reqwest::StatusCode;
//! use zonekeeper::http_errors::{classify_status, map_http_error_to_reason, StatusClass};
//!
//! assert_eq!(classify_status(StatusCode::CONFLICT), StatusClass::Retryable);
//! assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusClass::NotFound);
//!
//! let (reason, message) = map_http_error_to_reason(503);
//! assert_eq!(reason, "ServiceUnavailable");
//! assert!(message.contains("503"));
//! ```

use reqwest::StatusCode;

/// Coarse classification of a remote status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 404, the resource is absent
    NotFound,
    /// Transient condition on the remote side; the call should be repeated
    Retryable,
    /// Any other status; terminal
    Failure,
}

/// Determine if an HTTP status code is retryable.
///
/// # Retryable Status Codes
///
/// - **409** (Conflict) - a concurrent modification of the same parent zone is in flight
/// - **500** (Internal Server Error) - intermittent server error
/// - **502** (Bad Gateway) - Proxy/gateway error
/// - **503** (Service Unavailable) - Temporary unavailability
/// - **504** (Gateway Timeout) - Gateway timeout
#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::CONFLICT
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Classify a status code returned by the DNS control-plane API.
#[must_use]
pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else if is_retryable_status(status) {
        StatusClass::Retryable
    } else {
        StatusClass::Failure
    }
}

/// Map HTTP status code to a reason and message.
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 400 | `BadRequest` | Invalid request format |
/// | 401 | `AuthFailed` | Authentication required |
/// | 403 | `AuthFailed` | Insufficient permissions |
/// | 404 | `NotFound` | Resource not found |
/// | 409 | `ConcurrentModification` | Parent zone is being modified |
/// | 500 | `InternalError` | Internal server error |
/// | 502 | `GatewayError` | Bad gateway |
/// | 503 | `ServiceUnavailable` | Service unavailable |
/// | 504 | `GatewayError` | Gateway timeout |
/// | Other | `UnexpectedStatus` | Unexpected error |
#[must_use]
pub fn map_http_error_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        400 => ("BadRequest", "Invalid request to DNS API (400)".into()),
        401 => ("AuthFailed", "DNS API authentication required (401)".into()),
        403 => ("AuthFailed", "DNS API authorization failed (403)".into()),
        404 => ("NotFound", "Zone or record set not found (404)".into()),
        409 => (
            "ConcurrentModification",
            "Concurrent modification of the parent zone (409)".into(),
        ),
        500 => ("InternalError", "DNS API internal error (500)".into()),
        502 => ("GatewayError", "Bad gateway reaching DNS API (502)".into()),
        503 => (
            "ServiceUnavailable",
            "DNS API service unavailable (503)".into(),
        ),
        504 => (
            "GatewayError",
            "Gateway timeout reaching DNS API (504)".into(),
        ),
        _ => (
            "UnexpectedStatus",
            format!("Unexpected HTTP status from DNS API ({status_code})"),
        ),
    }
}

#[cfg(test)]
#[path = "http_errors_tests.rs"]
mod http_errors_tests;
