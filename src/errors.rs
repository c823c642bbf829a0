// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for zone and record-set reconciliation.
//!
//! This module provides specialized error types for:
//! - Remote DNS control-plane API failures (`ApiError`)
//! - Zone lifecycle operations (`ZoneError`)
//! - Record-set lifecycle operations (`RecordError`)
//! - Bounded polling deadlines (`TimeoutError`)
//! - Persisted identifier decoding (`IdentifierError`)
//!
//! Every terminal error carries the identity of the resource it concerns
//! (zone, and for record sets also name and type) together with the remote
//! status and message, so a single log line is enough to diagnose a failure.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::http_errors::{is_retryable_status, map_http_error_to_reason};

/// A failed call to the remote DNS control-plane API.
///
/// `status` is `None` when no HTTP response was received at all (connection
/// refused, DNS failure, body decode failure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe_api_error(.status, .message))]
pub struct ApiError {
    /// HTTP status returned by the API, if any
    pub status: Option<StatusCode>,
    /// Problem detail or transport error message
    pub message: String,
}

fn describe_api_error(status: &Option<StatusCode>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {}: {message}", status.as_u16()),
        None => format!("transport error: {message}"),
    }
}

impl ApiError {
    /// Build an error for a response with the given status.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build an error for a request that never produced a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Returns true if the remote reported the resource as absent (HTTP 404).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }

    /// Returns true if the status is in the retryable set.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status.is_some_and(is_retryable_status)
    }
}

/// Errors that can occur during zone lifecycle operations.
#[derive(Error, Debug, Clone)]
pub enum ZoneError {
    /// The zone does not exist on the remote side.
    ///
    /// Returned when a record set references a parent zone that cannot be
    /// found, and by the read-only zone lookup.
    #[error("Zone '{zone}' not found")]
    ZoneNotFound {
        /// The zone name that was not found
        zone: String,
    },

    /// Zone creation was rejected
    #[error("Failed to create zone '{zone}': {source}")]
    ZoneCreationFailed {
        /// The zone name that failed to create
        zone: String,
        /// Remote failure
        source: ApiError,
    },

    /// Zone read failed for a reason other than absence
    #[error("Failed to read zone '{zone}': {source}")]
    ZoneReadFailed {
        /// The zone name being read
        zone: String,
        /// Remote failure
        source: ApiError,
    },

    /// Comment update was rejected
    #[error("Failed to update zone '{zone}': {source}")]
    ZoneUpdateFailed {
        /// The zone name being updated
        zone: String,
        /// Remote failure
        source: ApiError,
    },

    /// The delete request itself was rejected
    #[error("Failed to delete zone '{zone}': {source}")]
    ZoneDeletionFailed {
        /// The zone name that failed to delete
        zone: String,
        /// Remote failure
        source: ApiError,
    },

    /// Checking the status of an accepted delete request failed
    #[error("Failed to check delete request '{request_id}' for zone '{zone}': {source}")]
    DeleteStatusFailed {
        /// The zone being deleted
        zone: String,
        /// Request id returned by the delete call
        request_id: String,
        /// Remote failure
        source: ApiError,
    },

    /// The delete request completed but reported failed zones
    #[error("Delete request '{request_id}' for zone '{zone}' completed with {failure_count} failures")]
    DeleteRequestFailed {
        /// The zone being deleted
        zone: String,
        /// Request id returned by the delete call
        request_id: String,
        /// Number of zones the request failed to delete
        failure_count: u32,
    },

    /// Opening or submitting the post-create change list failed
    #[error("Change list for zone '{zone}' failed: {source}")]
    ChangeListFailed {
        /// The zone owning the change list
        zone: String,
        /// Remote failure
        source: ApiError,
    },

    /// The change list opened right after zone creation is already stale.
    ///
    /// Someone else edited the zone between create and change-list open; the
    /// environment is inconsistent and blind retry would hide that.
    #[error("Change list for zone '{zone}' is stale immediately after creation")]
    StaleChangeList {
        /// The zone owning the stale change list
        zone: String,
    },
}

impl ZoneError {
    fn api_source(&self) -> Option<&ApiError> {
        match self {
            Self::ZoneCreationFailed { source, .. }
            | Self::ZoneReadFailed { source, .. }
            | Self::ZoneUpdateFailed { source, .. }
            | Self::ZoneDeletionFailed { source, .. }
            | Self::DeleteStatusFailed { source, .. }
            | Self::ChangeListFailed { source, .. } => Some(source),
            Self::ZoneNotFound { .. }
            | Self::DeleteRequestFailed { .. }
            | Self::StaleChangeList { .. } => None,
        }
    }
}

/// Errors that can occur during record-set lifecycle operations.
#[derive(Error, Debug, Clone)]
pub enum RecordError {
    /// Record set creation was rejected
    #[error("Failed to create record set '{name}' ({record_type}) in zone '{zone}': {source}")]
    RecordCreationFailed {
        /// Owning zone
        zone: String,
        /// Canonical record name
        name: String,
        /// Record type mnemonic
        record_type: String,
        /// Remote failure
        source: ApiError,
    },

    /// Record set read failed for a reason other than absence
    #[error("Failed to read record set '{name}' ({record_type}) in zone '{zone}': {source}")]
    RecordReadFailed {
        /// Owning zone
        zone: String,
        /// Canonical record name
        name: String,
        /// Record type mnemonic
        record_type: String,
        /// Remote failure
        source: ApiError,
    },

    /// Record set update was rejected with an error
    #[error("Failed to update record set '{name}' ({record_type}) in zone '{zone}': {source}")]
    RecordUpdateFailed {
        /// Owning zone
        zone: String,
        /// Canonical record name
        name: String,
        /// Record type mnemonic
        record_type: String,
        /// Remote failure
        source: ApiError,
    },

    /// Record set update answered with a non-success status but no error body
    #[error("Could not update record set '{name}' ({record_type}) in zone '{zone}': HTTP {status}")]
    RecordUpdateRejected {
        /// Owning zone
        zone: String,
        /// Canonical record name
        name: String,
        /// Record type mnemonic
        record_type: String,
        /// Status returned by the update call
        status: u16,
    },

    /// Record set deletion was rejected
    #[error("Failed to delete record set '{name}' ({record_type}) in zone '{zone}': {source}")]
    RecordDeletionFailed {
        /// Owning zone
        zone: String,
        /// Canonical record name
        name: String,
        /// Record type mnemonic
        record_type: String,
        /// Remote failure
        source: ApiError,
    },

    /// Record set is absent where it must exist (import)
    #[error("Record set '{name}' ({record_type}) not found in zone '{zone}'")]
    RecordNotFound {
        /// Owning zone
        zone: String,
        /// Canonical record name
        name: String,
        /// Record type mnemonic
        record_type: String,
    },
}

impl RecordError {
    fn api_source(&self) -> Option<&ApiError> {
        match self {
            Self::RecordCreationFailed { source, .. }
            | Self::RecordReadFailed { source, .. }
            | Self::RecordUpdateFailed { source, .. }
            | Self::RecordDeletionFailed { source, .. } => Some(source),
            Self::RecordUpdateRejected { .. } | Self::RecordNotFound { .. } => None,
        }
    }
}

/// A polled operation kept observing retryable outcomes until its deadline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Operation '{operation}' timed out after {attempts} attempts ({elapsed:?}); last outcome: {last_outcome}")]
pub struct TimeoutError {
    /// Human-readable operation name (e.g. "delete zone example.com")
    pub operation: String,
    /// Number of remote calls performed
    pub attempts: u32,
    /// Time spent polling
    pub elapsed: Duration,
    /// Description of the last retryable outcome
    pub last_outcome: String,
}

/// Errors decoding a persisted record identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier does not split into zone, name and type
    #[error("Malformed record identifier '{id}': {reason}. Expected ZONE|NAME|TYPE")]
    Malformed {
        /// The identifier as supplied
        id: String,
        /// Explanation of what is wrong
        reason: String,
    },
}

/// Composite error type that encompasses all reconciliation errors.
///
/// This is the error type returned by the zone and record lifecycle managers.
#[derive(Error, Debug, Clone)]
pub enum DnsError {
    /// Zone-related error (creation, deletion, not found, etc.)
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Record-set-related error (create, update, delete, etc.)
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A polled operation ran out of time
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// A persisted identifier could not be decoded
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

impl DnsError {
    /// Returns true if this error is transient and the operation could succeed later.
    ///
    /// Deadline failures and remote failures carrying a retryable status are
    /// transient. Missing resources, stale change lists, malformed identifiers
    /// and permanent 4xx rejections are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Zone(e) => e.api_source().is_some_and(ApiError::is_retryable),
            Self::Record(e) => e.api_source().is_some_and(ApiError::is_retryable),
            Self::Identifier(_) => false,
        }
    }

    /// Returns a CamelCase reason code for this error.
    ///
    /// Used in log fields and metrics labels to provide structured error information.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Zone(ZoneError::ZoneNotFound { .. }) => "ZoneNotFound",
            Self::Zone(ZoneError::ZoneCreationFailed { .. }) => "ZoneCreationFailed",
            Self::Zone(ZoneError::ZoneReadFailed { .. }) => "ZoneReadFailed",
            Self::Zone(ZoneError::ZoneUpdateFailed { .. }) => "ZoneUpdateFailed",
            Self::Zone(ZoneError::ZoneDeletionFailed { .. }) => "ZoneDeletionFailed",
            Self::Zone(ZoneError::DeleteStatusFailed { .. }) => "ZoneDeleteStatusFailed",
            Self::Zone(ZoneError::DeleteRequestFailed { .. }) => "ZoneDeleteRequestFailed",
            Self::Zone(ZoneError::ChangeListFailed { .. }) => "ChangeListFailed",
            Self::Zone(ZoneError::StaleChangeList { .. }) => "StaleChangeList",

            Self::Record(RecordError::RecordCreationFailed { .. }) => "RecordCreationFailed",
            Self::Record(RecordError::RecordReadFailed { .. }) => "RecordReadFailed",
            Self::Record(RecordError::RecordUpdateFailed { .. }) => "RecordUpdateFailed",
            Self::Record(RecordError::RecordUpdateRejected { .. }) => "RecordUpdateRejected",
            Self::Record(RecordError::RecordDeletionFailed { .. }) => "RecordDeletionFailed",
            Self::Record(RecordError::RecordNotFound { .. }) => "RecordNotFound",

            Self::Timeout(_) => "OperationTimedOut",
            Self::Identifier(_) => "MalformedIdentifier",
        }
    }

    /// Human-readable explanation of the remote status behind this error, if any.
    #[must_use]
    pub fn remote_reason(&self) -> Option<String> {
        let source = match self {
            Self::Zone(e) => e.api_source(),
            Self::Record(e) => e.api_source(),
            Self::Timeout(_) | Self::Identifier(_) => None,
        }?;
        source
            .status
            .map(|status| map_http_error_to_reason(status.as_u16()).1)
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
