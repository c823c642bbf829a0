// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone lifecycle management.
//!
//! A zone is identified by its name, which is also the stored identifier.
//! Creating a zone opens and submits an empty change list so the remote side
//! materializes the default SOA and NS records. Deleting a zone is
//! asynchronous: the delete call returns a request id whose status is polled
//! until it reports completion.
//!
//! Only the comment can be changed in place. Changes to other attributes are
//! logged and ignored; a different zone name is a different zone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{ApiResponse, DnsApi, Zone, ZoneDeleteRequest, ZoneDeleteStatus, ZoneRequest};
use crate::constants::{DEFAULT_ZONE_COMMENT, KIND_ZONE};
use crate::errors::{ApiError, DnsError, ZoneError};
use crate::metrics;
use crate::poller::{classify_response, poll, PollConfig, PollOutcome};

// ============================================================================
// Types
// ============================================================================

/// Kind of zone hosted by the remote side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneType {
    /// Authoritative zone edited through the API
    #[default]
    Primary,
    /// Zone transferred from external primaries
    Secondary,
    /// Zone sharing the records of another zone
    Alias,
}

impl ZoneType {
    /// Wire spelling of the zone type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Secondary => "SECONDARY",
            Self::Alias => "ALIAS",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRIMARY" => Ok(Self::Primary),
            "SECONDARY" => Ok(Self::Secondary),
            "ALIAS" => Ok(Self::Alias),
            other => Err(format!(
                "unknown zone type '{other}', expected PRIMARY, SECONDARY or ALIAS"
            )),
        }
    }
}

fn default_comment() -> String {
    DEFAULT_ZONE_COMMENT.to_string()
}

/// Desired attributes of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneConfig {
    /// Zone name, immutable once created
    pub zone: String,
    /// Contract the zone is created under
    pub contract_id: String,
    /// Zone type
    #[serde(rename = "type", default)]
    pub zone_type: ZoneType,
    /// Whether DNSSEC signing is enabled
    #[serde(default)]
    pub sign_and_serve: bool,
    /// Free-form comment, the only attribute updatable in place
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl ZoneConfig {
    /// Desired zone with default type, signing and comment.
    pub fn new(zone: impl Into<String>, contract_id: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            contract_id: contract_id.into(),
            zone_type: ZoneType::default(),
            sign_and_serve: false,
            comment: default_comment(),
        }
    }

    fn request(&self) -> ZoneRequest {
        ZoneRequest {
            zone: self.zone.clone(),
            zone_type: self.zone_type.as_str().to_string(),
            comment: self.comment.clone(),
            sign_and_serve: self.sign_and_serve,
        }
    }

    /// Attributes that differ from `state` but cannot be changed in place.
    #[must_use]
    pub fn immutable_changes(&self, state: &ZoneState) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if !state.contract_id.is_empty() && state.contract_id != self.contract_id {
            changed.push("contractId");
        }
        if !state.zone_type.eq_ignore_ascii_case(self.zone_type.as_str()) {
            changed.push("type");
        }
        if state.sign_and_serve != self.sign_and_serve {
            changed.push("signAndServe");
        }
        changed
    }
}

/// Observed state of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneState {
    /// Stored identifier, the zone name verbatim
    pub id: String,
    /// Zone name
    pub zone: String,
    /// Contract the zone belongs to, empty if the API did not report one
    #[serde(default)]
    pub contract_id: String,
    /// Zone type as reported by the API
    #[serde(rename = "type")]
    pub zone_type: String,
    /// Whether DNSSEC signing is enabled
    #[serde(default)]
    pub sign_and_serve: bool,
    /// Comment
    #[serde(default)]
    pub comment: String,
    /// Activation state, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_state: Option<String>,
}

impl ZoneState {
    fn from_remote(zone: Zone) -> Self {
        Self {
            id: zone.zone.clone(),
            contract_id: zone.contract_id.unwrap_or_default(),
            zone_type: zone
                .zone_type
                .unwrap_or_else(|| ZoneType::default().as_str().to_string()),
            sign_and_serve: zone.sign_and_serve.unwrap_or(false),
            comment: zone.comment.unwrap_or_default(),
            activation_state: zone.activation_state,
            zone: zone.zone,
        }
    }

    fn from_config(config: &ZoneConfig) -> Self {
        Self {
            id: config.zone.clone(),
            zone: config.zone.clone(),
            contract_id: config.contract_id.clone(),
            zone_type: config.zone_type.as_str().to_string(),
            sign_and_serve: config.sign_and_serve,
            comment: config.comment.clone(),
            activation_state: None,
        }
    }
}

// ============================================================================
// Lifecycle Operations
// ============================================================================

/// Create a zone and materialize its default records.
///
/// The create call is not retried. After it succeeds a change list is opened
/// and submitted unchanged; a change list that is stale right after opening
/// is a terminal error.
///
/// # Errors
///
/// - [`ZoneError::ZoneCreationFailed`] if the create call fails
/// - [`ZoneError::ChangeListFailed`] if the change list cannot be opened or submitted
/// - [`ZoneError::StaleChangeList`] if the fresh change list is already stale
/// - [`ZoneError::ZoneReadFailed`] if the final read fails
pub async fn create_zone<A: DnsApi + ?Sized>(
    api: &A,
    config: &ZoneConfig,
) -> Result<ZoneState, DnsError> {
    let started = Instant::now();
    let result = create_zone_inner(api, config).await;
    metrics::record_operation(KIND_ZONE, "create", started, &result);
    if result.is_ok() {
        metrics::record_resource_created(KIND_ZONE);
    }
    result
}

async fn create_zone_inner<A: DnsApi + ?Sized>(
    api: &A,
    config: &ZoneConfig,
) -> Result<ZoneState, DnsError> {
    let zone = config.zone.as_str();
    info!(zone = %zone, zone_type = %config.zone_type, "Creating zone");

    api.create_zone(&config.contract_id, &config.request())
        .await
        .and_then(ApiResponse::into_success)
        .map_err(|source| ZoneError::ZoneCreationFailed {
            zone: zone.to_string(),
            source,
        })?;

    materialize_default_records(api, zone).await?;

    info!(zone = %zone, "Zone created");
    match read_zone(api, zone).await? {
        Some(state) => Ok(state),
        None => {
            warn!(zone = %zone, "Zone not visible yet after create, using desired attributes");
            Ok(ZoneState::from_config(config))
        }
    }
}

async fn materialize_default_records<A: DnsApi + ?Sized>(api: &A, zone: &str) -> Result<(), DnsError> {
    let change_list_failed = |source: ApiError| ZoneError::ChangeListFailed {
        zone: zone.to_string(),
        source,
    };

    let change_list = api
        .create_change_list(zone)
        .await
        .and_then(ApiResponse::into_success)
        .map_err(change_list_failed)?;

    if change_list.stale {
        return Err(ZoneError::StaleChangeList {
            zone: zone.to_string(),
        }
        .into());
    }

    api.submit_change_list(zone)
        .await
        .and_then(ApiResponse::into_success)
        .map_err(change_list_failed)?;

    debug!(zone = %zone, "Submitted initial change list");
    Ok(())
}

/// Read a zone.
///
/// Returns `Ok(None)` when the zone does not exist, so the caller can drop
/// it from state.
///
/// # Errors
///
/// Returns [`ZoneError::ZoneReadFailed`] on any failure other than not-found.
pub async fn read_zone<A: DnsApi + ?Sized>(
    api: &A,
    zone: &str,
) -> Result<Option<ZoneState>, DnsError> {
    let started = Instant::now();
    let result = match api.get_zone(zone).await.and_then(ApiResponse::into_success) {
        Ok(remote) => Ok(Some(ZoneState::from_remote(remote))),
        Err(e) if e.is_not_found() => {
            info!(zone = %zone, "Zone no longer exists");
            Ok(None)
        }
        Err(source) => Err(ZoneError::ZoneReadFailed {
            zone: zone.to_string(),
            source,
        }
        .into()),
    };
    metrics::record_operation(KIND_ZONE, "read", started, &result);
    result
}

/// Look up an existing zone.
///
/// Unlike [`read_zone`], absence is an error.
///
/// # Errors
///
/// - [`ZoneError::ZoneNotFound`] if the zone does not exist
/// - [`ZoneError::ZoneReadFailed`] on any other failure
pub async fn lookup_zone<A: DnsApi + ?Sized>(api: &A, zone: &str) -> Result<ZoneState, DnsError> {
    read_zone(api, zone).await?.ok_or_else(|| {
        ZoneError::ZoneNotFound {
            zone: zone.to_string(),
        }
        .into()
    })
}

/// Update the comment of a zone and re-read it.
///
/// No call is made when the comment is unchanged.
///
/// # Errors
///
/// - [`ZoneError::ZoneUpdateFailed`] if the update call fails
/// - [`ZoneError::ZoneNotFound`] if the zone disappeared
/// - [`ZoneError::ZoneReadFailed`] if the re-read fails
pub async fn update_zone<A: DnsApi + ?Sized>(
    api: &A,
    prior: &ZoneState,
    desired: &ZoneConfig,
) -> Result<ZoneState, DnsError> {
    let started = Instant::now();
    let result = update_zone_inner(api, prior, desired).await;
    metrics::record_operation(KIND_ZONE, "update", started, &result);
    result
}

async fn update_zone_inner<A: DnsApi + ?Sized>(
    api: &A,
    prior: &ZoneState,
    desired: &ZoneConfig,
) -> Result<ZoneState, DnsError> {
    let zone = desired.zone.as_str();

    let ignored = desired.immutable_changes(prior);
    if !ignored.is_empty() {
        warn!(
            zone = %zone,
            attributes = ?ignored,
            "Attributes cannot be changed in place and are left as they are"
        );
    }

    if prior.comment != desired.comment {
        info!(zone = %zone, "Updating zone comment");
        let mut request = desired.request();
        request.zone_type = prior.zone_type.clone();
        request.sign_and_serve = prior.sign_and_serve;

        api.update_zone(&request)
            .await
            .and_then(ApiResponse::into_success)
            .map_err(|source| ZoneError::ZoneUpdateFailed {
                zone: zone.to_string(),
                source,
            })?;
        metrics::record_resource_updated(KIND_ZONE);
    } else {
        debug!(zone = %zone, "Zone comment unchanged");
    }

    lookup_zone(api, zone).await
}

/// Delete a zone and wait for the asynchronous delete to complete.
///
/// Both the delete call and each status check are polled. A status check
/// reporting the request as not yet complete is pending. A zone that is
/// already gone when the delete is issued counts as deleted.
///
/// # Errors
///
/// - [`ZoneError::ZoneDeletionFailed`] if the delete call fails terminally
/// - [`ZoneError::DeleteRequestFailed`] if the completed request reports failures
/// - [`ZoneError::DeleteStatusFailed`] if a status check fails terminally
/// - [`DnsError::Timeout`] if either phase exceeds the poll deadline
pub async fn delete_zone<A: DnsApi + ?Sized>(
    api: &A,
    zone: &str,
    force: bool,
    poll_config: &PollConfig,
) -> Result<(), DnsError> {
    let started = Instant::now();
    let result = delete_zone_inner(api, zone, force, poll_config).await;
    metrics::record_operation(KIND_ZONE, "delete", started, &result);
    if result.is_ok() {
        metrics::record_resource_deleted(KIND_ZONE);
    }
    result
}

async fn delete_zone_inner<A: DnsApi + ?Sized>(
    api: &A,
    zone: &str,
    force: bool,
    poll_config: &PollConfig,
) -> Result<(), DnsError> {
    info!(zone = %zone, force = force, "Deleting zone");

    let request = ZoneDeleteRequest {
        zones: vec![zone.to_string()],
    };
    let request = &request;
    let submitted = poll(poll_config, &format!("delete zone {zone}"), move || async move {
        match classify_response(api.delete_zone(request, force).await) {
            PollOutcome::Failed(e) if e.is_not_found() => PollOutcome::Done(None),
            PollOutcome::Done(response) => PollOutcome::Done(Some(response)),
            PollOutcome::Pending(observed) => PollOutcome::Pending(observed),
            PollOutcome::Failed(e) => PollOutcome::Failed(e),
        }
    })
    .await
    .map_err(|e| {
        e.into_dns_error(|source| {
            ZoneError::ZoneDeletionFailed {
                zone: zone.to_string(),
                source,
            }
            .into()
        })
    })?;

    let Some(submitted) = submitted else {
        info!(zone = %zone, "Zone already absent");
        return Ok(());
    };
    let request_id = submitted.request_id;
    debug!(zone = %zone, request_id = %request_id, "Delete request accepted");

    let id = request_id.as_str();
    let status = poll(
        poll_config,
        &format!("delete status {request_id}"),
        move || async move {
            match classify_response(api.delete_zone_status(id).await) {
                PollOutcome::Done(status) if !status.is_complete => {
                    PollOutcome::Pending(format!("delete request {id} not complete"))
                }
                other => other,
            }
        },
    )
    .await
    .map_err(|e| {
        e.into_dns_error(|source| {
            ZoneError::DeleteStatusFailed {
                zone: zone.to_string(),
                request_id: request_id.clone(),
                source,
            }
            .into()
        })
    })?;

    check_delete_status(zone, &status)?;
    info!(zone = %zone, request_id = %request_id, "Zone deleted");
    Ok(())
}

fn check_delete_status(zone: &str, status: &ZoneDeleteStatus) -> Result<(), DnsError> {
    if status.failure_count == 0 {
        return Ok(());
    }
    Err(ZoneError::DeleteRequestFailed {
        zone: zone.to_string(),
        request_id: status.request_id.clone(),
        failure_count: status.failure_count,
    }
    .into())
}

#[cfg(test)]
#[path = "zones_tests.rs"]
mod zones_tests;
