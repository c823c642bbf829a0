// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record-set lifecycle management.
//!
//! A record set is identified by (zone, canonical name, type). Name and type
//! cannot be changed server-side, so an update that touches them creates the
//! new record set and deletes the old one. TTL and rdata changes are a single
//! in-place update call.
//!
//! Create and delete go through the poller: both race with concurrent edits
//! to sibling records of the same zone, which the API reports as a conflict.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{ApiResponse, DnsApi, RecordSet};
use crate::constants::KIND_RECORD_SET;
use crate::errors::{ApiError, DnsError, RecordError, ZoneError};
use crate::identifier::{self, RecordId};
use crate::metrics;
use crate::naming::{canonicalize, relative_name};
use crate::poller::{classify_response, poll, PollConfig, PollOutcome};
use crate::rdata;

// ============================================================================
// Types
// ============================================================================

/// Desired attributes of a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Owning zone
    pub zone: String,
    /// Owner name, relative to the zone or fully qualified; empty for the apex
    #[serde(default)]
    pub name: String,
    /// Record type mnemonic
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time to live in seconds
    pub ttl: u32,
    /// Record data, in the order given
    pub rdata: Vec<String>,
}

impl RecordConfig {
    /// Fully qualified, lower-case owner name.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        canonicalize(&self.name, &self.zone)
    }

    /// Identity of the record set this configuration describes.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        RecordId::new(
            self.zone.as_str(),
            self.canonical_name(),
            self.record_type.as_str(),
        )
    }

    fn request(&self) -> RecordSet {
        let id = self.record_id();
        RecordSet {
            rdata: rdata::to_remote(&id.record_type, &self.rdata),
            name: id.name,
            record_type: id.record_type,
            ttl: self.ttl,
        }
    }
}

/// Observed state of a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordState {
    /// Stored identifier, `zone|canonical name|type`
    pub id: String,
    /// Owning zone
    pub zone: String,
    /// Owner name as the user spelled it
    pub name: String,
    /// Canonical owner name
    pub fqdn: String,
    /// Record type mnemonic
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time to live in seconds
    pub ttl: u32,
    /// Record data with remote transforms inverted
    pub rdata: Vec<String>,
}

impl RecordState {
    fn from_config(config: &RecordConfig) -> Self {
        let id = config.record_id();
        Self {
            id: id.to_string(),
            zone: id.zone,
            name: config.name.clone(),
            fqdn: id.name,
            record_type: id.record_type,
            ttl: config.ttl,
            rdata: config.rdata.clone(),
        }
    }

    /// Identity stored in this state.
    ///
    /// # Errors
    ///
    /// Returns [`DnsError::Identifier`] if the stored identifier is malformed.
    pub fn record_id(&self) -> Result<RecordId, DnsError> {
        Ok(identifier::decode(&self.id)?)
    }
}

/// Whether `desired` addresses a different record set than `prior`.
///
/// Identities are compared in canonical form, so `www` and `www.example.com.`
/// in zone `example.com` are the same record set, as are types `a` and `A`.
#[must_use]
pub fn requires_replacement(prior: &RecordState, desired: &RecordConfig) -> bool {
    let prior_id = RecordId::new(&prior.zone, &prior.fqdn, &prior.record_type);
    prior_id != desired.record_id()
}

// ============================================================================
// Helpers
// ============================================================================

/// Check that the owning zone exists.
///
/// Returns `Ok(false)` when it does not.
async fn zone_exists<A: DnsApi + ?Sized>(api: &A, zone: &str) -> Result<bool, DnsError> {
    match api.get_zone(zone).await.and_then(ApiResponse::into_success) {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(source) => Err(ZoneError::ZoneReadFailed {
            zone: zone.to_string(),
            source,
        }
        .into()),
    }
}

async fn resolve_zone<A: DnsApi + ?Sized>(api: &A, zone: &str) -> Result<(), DnsError> {
    if zone_exists(api, zone).await? {
        Ok(())
    } else {
        Err(ZoneError::ZoneNotFound {
            zone: zone.to_string(),
        }
        .into())
    }
}

fn state_from_remote(
    id: &RecordId,
    record: RecordSet,
    desired: Option<&RecordConfig>,
) -> RecordState {
    let live = rdata::from_remote(&id.record_type, &record.rdata);
    let (name, rdata) = match desired {
        Some(desired) => (
            desired.name.clone(),
            rdata::preserve_spelling(&id.record_type, live, &desired.rdata),
        ),
        None => (relative_name(&id.name, &id.zone), live),
    };
    RecordState {
        id: id.to_string(),
        zone: id.zone.clone(),
        name,
        fqdn: id.name.clone(),
        record_type: id.record_type.clone(),
        ttl: record.ttl,
        rdata,
    }
}

// ============================================================================
// Lifecycle Operations
// ============================================================================

/// Create a record set.
///
/// # Errors
///
/// - [`ZoneError::ZoneNotFound`] if the owning zone does not exist
/// - [`RecordError::RecordCreationFailed`] on a terminal create failure
/// - [`DnsError::Timeout`] if conflicts or server errors outlast the poll deadline
pub async fn create_record<A: DnsApi + ?Sized>(
    api: &A,
    config: &RecordConfig,
    poll_config: &PollConfig,
) -> Result<RecordState, DnsError> {
    let started = Instant::now();
    let result = create_record_inner(api, config, poll_config).await;
    metrics::record_operation(KIND_RECORD_SET, "create", started, &result);
    if result.is_ok() {
        metrics::record_resource_created(KIND_RECORD_SET);
    }
    result
}

async fn create_record_inner<A: DnsApi + ?Sized>(
    api: &A,
    config: &RecordConfig,
    poll_config: &PollConfig,
) -> Result<RecordState, DnsError> {
    let id = config.record_id();
    resolve_zone(api, &id.zone).await?;

    let body = config.request();
    info!(
        zone = %id.zone,
        name = %id.name,
        record_type = %id.record_type,
        "Creating record set"
    );

    let zone = id.zone.as_str();
    let body_ref = &body;
    poll(
        poll_config,
        &format!("create record set {id}"),
        move || async move { classify_response(api.create_record_set(zone, body_ref).await) },
    )
    .await
    .map_err(|e| {
        e.into_dns_error(|source| {
            RecordError::RecordCreationFailed {
                zone: id.zone.clone(),
                name: id.name.clone(),
                record_type: id.record_type.clone(),
                source,
            }
            .into()
        })
    })?;

    Ok(RecordState::from_config(config))
}

/// Read a record set.
///
/// The name in `id` is canonicalized before the lookup. `desired`, when
/// given, supplies the user's spelling of the name and of CNAME targets.
/// Returns `Ok(None)` when the record set does not exist.
///
/// # Errors
///
/// Returns [`RecordError::RecordReadFailed`] on any failure other than not-found.
pub async fn read_record<A: DnsApi + ?Sized>(
    api: &A,
    id: &RecordId,
    desired: Option<&RecordConfig>,
) -> Result<Option<RecordState>, DnsError> {
    let started = Instant::now();
    let id = &id.canonicalized();
    let result = match api.get_record_set(id).await.and_then(ApiResponse::into_success) {
        Ok(record) => Ok(Some(state_from_remote(id, record, desired))),
        Err(e) if e.is_not_found() => {
            info!(
                zone = %id.zone,
                name = %id.name,
                record_type = %id.record_type,
                "Record set no longer exists"
            );
            Ok(None)
        }
        Err(source) => Err(RecordError::RecordReadFailed {
            zone: id.zone.clone(),
            name: id.name.clone(),
            record_type: id.record_type.clone(),
            source,
        }
        .into()),
    };
    metrics::record_operation(KIND_RECORD_SET, "read", started, &result);
    result
}

/// Read a record set by its stored identifier.
///
/// # Errors
///
/// - [`DnsError::Identifier`] if `id` is malformed; no call is made
/// - [`RecordError::RecordReadFailed`] on any failure other than not-found
pub async fn read_record_by_id<A: DnsApi + ?Sized>(
    api: &A,
    id: &str,
    desired: Option<&RecordConfig>,
) -> Result<Option<RecordState>, DnsError> {
    let id = identifier::decode(id)?;
    read_record(api, &id, desired).await
}

/// Update a record set.
///
/// When zone, name or type changed, the new record set is created and the
/// old one deleted afterwards. Otherwise TTL and rdata are replaced with a
/// single update call.
///
/// # Errors
///
/// - [`ZoneError::ZoneNotFound`] if the owning zone does not exist
/// - [`RecordError::RecordUpdateFailed`] if the update call fails
/// - [`RecordError::RecordUpdateRejected`] if it answers a non-2xx status without an error
/// - any error of [`create_record`] or [`delete_record`] on replacement
pub async fn update_record<A: DnsApi + ?Sized>(
    api: &A,
    prior: &RecordState,
    desired: &RecordConfig,
    poll_config: &PollConfig,
) -> Result<RecordState, DnsError> {
    if requires_replacement(prior, desired) {
        return replace_record(api, prior, desired, poll_config).await;
    }

    let started = Instant::now();
    let result = update_record_inner(api, desired).await;
    metrics::record_operation(KIND_RECORD_SET, "update", started, &result);
    if result.is_ok() {
        metrics::record_resource_updated(KIND_RECORD_SET);
    }
    result
}

async fn update_record_inner<A: DnsApi + ?Sized>(
    api: &A,
    desired: &RecordConfig,
) -> Result<RecordState, DnsError> {
    let id = desired.record_id();
    resolve_zone(api, &id.zone).await?;

    info!(
        zone = %id.zone,
        name = %id.name,
        record_type = %id.record_type,
        ttl = desired.ttl,
        "Updating record set"
    );

    let response = api
        .update_record_set(&id.zone, &desired.request())
        .await
        .map_err(|source| RecordError::RecordUpdateFailed {
            zone: id.zone.clone(),
            name: id.name.clone(),
            record_type: id.record_type.clone(),
            source,
        })?;

    if !response.status.is_success() {
        return Err(RecordError::RecordUpdateRejected {
            zone: id.zone,
            name: id.name,
            record_type: id.record_type,
            status: response.status.as_u16(),
        }
        .into());
    }

    Ok(RecordState::from_config(desired))
}

async fn replace_record<A: DnsApi + ?Sized>(
    api: &A,
    prior: &RecordState,
    desired: &RecordConfig,
    poll_config: &PollConfig,
) -> Result<RecordState, DnsError> {
    let old_id = prior.record_id()?;
    info!(
        old = %old_id,
        new = %desired.record_id(),
        "Record identity changed, replacing record set"
    );

    let state = create_record(api, desired, poll_config).await?;
    delete_record(api, &old_id, poll_config).await?;
    Ok(state)
}

/// Delete a record set.
///
/// A record set that is already gone, or whose zone is gone, counts as
/// deleted.
///
/// # Errors
///
/// - [`RecordError::RecordDeletionFailed`] on a terminal delete failure
/// - [`ZoneError::ZoneReadFailed`] if the owning zone cannot be checked
/// - [`DnsError::Timeout`] if conflicts or server errors outlast the poll deadline
pub async fn delete_record<A: DnsApi + ?Sized>(
    api: &A,
    id: &RecordId,
    poll_config: &PollConfig,
) -> Result<(), DnsError> {
    let started = Instant::now();
    let result = delete_record_inner(api, id, poll_config).await;
    metrics::record_operation(KIND_RECORD_SET, "delete", started, &result);
    if result.is_ok() {
        metrics::record_resource_deleted(KIND_RECORD_SET);
    }
    result
}

async fn delete_record_inner<A: DnsApi + ?Sized>(
    api: &A,
    id: &RecordId,
    poll_config: &PollConfig,
) -> Result<(), DnsError> {
    if !zone_exists(api, &id.zone).await? {
        warn!(zone = %id.zone, record = %id, "Zone already absent, nothing to delete");
        return Ok(());
    }

    info!(
        zone = %id.zone,
        name = %id.name,
        record_type = %id.record_type,
        "Deleting record set"
    );
    poll(
        poll_config,
        &format!("delete record set {id}"),
        move || async move {
            match classify_response(api.delete_record_set(id).await) {
                PollOutcome::Failed(e) if e.is_not_found() => {
                    debug!(record = %id, "Record set already absent");
                    PollOutcome::Done(())
                }
                other => other,
            }
        },
    )
    .await
    .map_err(|e| {
        e.into_dns_error(|source: ApiError| {
            RecordError::RecordDeletionFailed {
                zone: id.zone.clone(),
                name: id.name.clone(),
                record_type: id.record_type.clone(),
                source,
            }
            .into()
        })
    })
}

/// Import an existing record set by identifier.
///
/// The name in the returned state is relative to the zone, empty for the apex.
///
/// # Errors
///
/// - [`DnsError::Identifier`] if `id` is malformed; no call is made
/// - [`RecordError::RecordNotFound`] if the record set does not exist
/// - [`RecordError::RecordReadFailed`] on any other failure
pub async fn import_record<A: DnsApi + ?Sized>(api: &A, id: &str) -> Result<RecordState, DnsError> {
    let started = Instant::now();
    let result = import_record_inner(api, id).await;
    metrics::record_operation(KIND_RECORD_SET, "import", started, &result);
    result
}

async fn import_record_inner<A: DnsApi + ?Sized>(api: &A, id: &str) -> Result<RecordState, DnsError> {
    let id = identifier::decode(id)?.canonicalized();
    match read_record(api, &id, None).await? {
        Some(state) => Ok(state),
        None => Err(RecordError::RecordNotFound {
            zone: id.zone,
            name: id.name,
            record_type: id.record_type,
        }
        .into()),
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
