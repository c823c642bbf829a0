// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Remote DNS control-plane API abstraction.
//!
//! The lifecycle managers in [`crate::zones`] and [`crate::records`] talk to
//! the remote side exclusively through the [`DnsApi`] trait. The production
//! implementation is [`http::HttpDnsApi`]; tests substitute scripted fakes.
//!
//! Every call returns either an [`ApiResponse`] carrying the HTTP status next
//! to the decoded body, or an [`ApiError`]. Keeping the status on the success
//! path lets callers (and the poller) reject a response that decoded fine but
//! arrived with an unexpected status.

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::identifier::RecordId;

/// Decoded response of a successful API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// HTTP status of the response
    pub status: StatusCode,
    /// Decoded body
    pub body: T,
}

impl<T> ApiResponse<T> {
    /// Pair a status with a body.
    pub fn new(status: StatusCode, body: T) -> Self {
        Self { status, body }
    }

    /// Unwrap the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] carrying the status when it is not 2xx.
    pub fn into_success(self) -> Result<T, ApiError> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(ApiError::from_status(
                self.status,
                "unexpected status without error body",
            ))
        }
    }
}

/// Result of one API call.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Zone as reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Zone name
    pub zone: String,
    /// `PRIMARY`, `SECONDARY` or `ALIAS`
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
    /// Free-form comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Contract the zone is billed to
    #[serde(default)]
    pub contract_id: Option<String>,
    /// Whether DNSSEC signing is enabled
    #[serde(default)]
    pub sign_and_serve: Option<bool>,
    /// Activation state (`NEW`, `PENDING`, `ACTIVE`, ...)
    #[serde(default)]
    pub activation_state: Option<String>,
}

/// Body of a zone create or update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    /// Zone name
    pub zone: String,
    /// `PRIMARY`, `SECONDARY` or `ALIAS`
    #[serde(rename = "type")]
    pub zone_type: String,
    /// Free-form comment
    pub comment: String,
    /// Whether DNSSEC signing is enabled
    pub sign_and_serve: bool,
}

/// Body of a bulk zone delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDeleteRequest {
    /// Zones to delete
    pub zones: Vec<String>,
}

/// Answer to a bulk zone delete call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDeleteResponse {
    /// Handle used to poll completion
    pub request_id: String,
    /// When the request handle expires
    #[serde(default)]
    pub expiration_date: Option<String>,
}

/// Progress of a bulk zone delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDeleteStatus {
    /// Request handle
    pub request_id: String,
    /// Whether the delete finished
    pub is_complete: bool,
    /// Number of zones in the request
    #[serde(default)]
    pub zones_submitted: u32,
    /// Number of zones deleted
    #[serde(default)]
    pub success_count: u32,
    /// Number of zones that failed to delete
    #[serde(default)]
    pub failure_count: u32,
}

/// Change list metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeList {
    /// Zone the change list belongs to
    pub zone: String,
    /// True when the zone changed after the change list was opened
    #[serde(default)]
    pub stale: bool,
    /// Optimistic-locking tag
    #[serde(default)]
    pub change_tag: Option<String>,
    /// Version of the zone the change list is based on
    #[serde(default)]
    pub zone_version_id: Option<String>,
}

/// Record set as sent to and read from the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Canonical owner name
    pub name: String,
    /// Record type mnemonic
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time to live in seconds
    pub ttl: u32,
    /// Record data in remote format
    pub rdata: Vec<String>,
}

/// Operations of the remote DNS control-plane API used by zonekeeper.
///
/// Implementations must be cheap to share between concurrent reconciliations;
/// no call may depend on in-process state left by another call.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Fetch a zone.
    async fn get_zone(&self, zone: &str) -> ApiResult<Zone>;

    /// Create a zone under a contract.
    async fn create_zone(&self, contract_id: &str, request: &ZoneRequest) -> ApiResult<Zone>;

    /// Replace mutable zone settings.
    async fn update_zone(&self, request: &ZoneRequest) -> ApiResult<Zone>;

    /// Submit an asynchronous delete of one or more zones.
    async fn delete_zone(
        &self,
        request: &ZoneDeleteRequest,
        force: bool,
    ) -> ApiResult<ZoneDeleteResponse>;

    /// Check progress of a delete request.
    async fn delete_zone_status(&self, request_id: &str) -> ApiResult<ZoneDeleteStatus>;

    /// Open a change list for a zone.
    async fn create_change_list(&self, zone: &str) -> ApiResult<ChangeList>;

    /// Submit the open change list of a zone.
    async fn submit_change_list(&self, zone: &str) -> ApiResult<()>;

    /// Fetch a record set by zone, canonical name and type.
    async fn get_record_set(&self, id: &RecordId) -> ApiResult<RecordSet>;

    /// Create a record set in a zone.
    async fn create_record_set(&self, zone: &str, record: &RecordSet) -> ApiResult<RecordSet>;

    /// Replace TTL and rdata of an existing record set.
    async fn update_record_set(&self, zone: &str, record: &RecordSet) -> ApiResult<RecordSet>;

    /// Delete a record set.
    async fn delete_record_set(&self, id: &RecordId) -> ApiResult<()>;
}
