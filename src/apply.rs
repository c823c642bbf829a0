// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconcile a manifest against state and the remote API.
//!
//! # Order
//!
//! 1. Zones in the manifest are created, or read and updated.
//! 2. Record sets in the manifest are created, or read and updated,
//!    concurrently.
//! 3. Record sets only in state are deleted, concurrently.
//! 4. Zones only in state are deleted.
//!
//! A resource whose read reports absence is dropped from state and, if still
//! declared, created again. A failure is recorded in the report and leaves
//! the resource's state untouched; other resources proceed.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use tracing::{error, info, warn};

use crate::api::DnsApi;
use crate::constants::{KIND_RECORD_SET, KIND_ZONE, MAX_CONCURRENT_RECORD_OPERATIONS};
use crate::errors::DnsError;
use crate::manifest::{Manifest, RecordEntry};
use crate::poller::PollConfig;
use crate::rdata;
use crate::records::{self, RecordState};
use crate::state::StateFile;
use crate::zones::{self, ZoneConfig, ZoneState};

/// Settings of one reconciliation run.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Poll timing for create and delete operations
    pub poll: PollConfig,
    /// Delete zones even when they still hold non-default record sets
    pub force_zone_delete: bool,
    /// Maximum record sets reconciled at once
    pub concurrency: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            force_zone_delete: false,
            concurrency: MAX_CONCURRENT_RECORD_OPERATIONS,
        }
    }
}

/// What happened to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Created
    Created,
    /// Updated in place or replaced
    Updated,
    /// Live state matches the manifest
    Unchanged,
    /// Deleted
    Deleted,
    /// Gone remotely and no longer declared; removed from state
    Dropped,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Deleted => "deleted",
            Self::Dropped => "dropped",
        };
        f.write_str(text)
    }
}

/// Failure of one resource.
#[derive(Debug)]
pub struct Failure {
    /// `Zone` or `RecordSet`
    pub kind: &'static str,
    /// Zone name or record address
    pub address: String,
    /// Cause
    pub error: DnsError,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Successful actions as (kind, address, action)
    pub actions: Vec<(&'static str, String, Action)>,
    /// Failed resources
    pub failures: Vec<Failure>,
}

impl ApplyReport {
    fn record(&mut self, kind: &'static str, address: String, action: Action) {
        info!(kind = kind, address = %address, action = %action, "Resource reconciled");
        self.actions.push((kind, address, action));
    }

    fn fail(&mut self, kind: &'static str, address: String, error: DnsError) {
        error!(
            kind = kind,
            address = %address,
            reason = error.status_reason(),
            error = %error,
            "Resource failed"
        );
        self.failures.push(Failure {
            kind,
            address,
            error,
        });
    }

    /// Number of successful actions of a given type.
    #[must_use]
    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|(_, _, a)| *a == action).count()
    }

    /// Whether every resource succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Zones
// ============================================================================

async fn reconcile_zone<A: DnsApi + ?Sized>(
    api: &A,
    desired: &ZoneConfig,
    prior: Option<&ZoneState>,
) -> Result<(ZoneState, Action), DnsError> {
    let Some(prior) = prior else {
        return Ok((zones::create_zone(api, desired).await?, Action::Created));
    };

    match zones::read_zone(api, &prior.id).await? {
        None => {
            warn!(zone = %desired.zone, "Zone disappeared remotely, creating it again");
            Ok((zones::create_zone(api, desired).await?, Action::Created))
        }
        Some(live) if live.comment == desired.comment => Ok((live, Action::Unchanged)),
        Some(live) => Ok((zones::update_zone(api, &live, desired).await?, Action::Updated)),
    }
}

// ============================================================================
// Record Sets
// ============================================================================

fn matches_desired(live: &RecordState, desired: &records::RecordConfig) -> bool {
    !records::requires_replacement(live, desired)
        && live.ttl == desired.ttl
        && live.rdata == desired.rdata
}

async fn reconcile_record<A: DnsApi + ?Sized>(
    api: &A,
    entry: &RecordEntry,
    prior: Option<&RecordState>,
    poll: &PollConfig,
) -> Result<(RecordState, Action), DnsError> {
    let desired = &entry.record;
    let Some(prior) = prior else {
        return Ok((records::create_record(api, desired, poll).await?, Action::Created));
    };

    let live = records::read_record(api, &prior.record_id()?, Some(desired)).await?;
    match live {
        None => {
            warn!(
                address = %entry.address(),
                "Record set disappeared remotely, creating it again"
            );
            Ok((records::create_record(api, desired, poll).await?, Action::Created))
        }
        Some(live) if matches_desired(&live, desired) => Ok((live, Action::Unchanged)),
        Some(live) => Ok((
            records::update_record(api, &live, desired, poll).await?,
            Action::Updated,
        )),
    }
}

async fn remove_record<A: DnsApi + ?Sized>(
    api: &A,
    prior: &RecordState,
    poll: &PollConfig,
) -> Result<(), DnsError> {
    records::delete_record(api, &prior.record_id()?, poll).await
}

/// Delete every record set of `addresses` from the API, concurrently.
async fn delete_records<A: DnsApi + ?Sized>(
    api: &A,
    state: &mut StateFile,
    addresses: Vec<String>,
    options: &ApplyOptions,
    report: &mut ApplyReport,
) {
    let results: Vec<(String, Result<(), DnsError>)> = {
        let snapshot = &*state;
        stream::iter(addresses)
            .map(|address| async move {
                let result = match snapshot.records.get(&address) {
                    Some(prior) => remove_record(api, prior, &options.poll).await,
                    None => Ok(()),
                };
                (address, result)
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await
    };

    for (address, result) in results {
        match result {
            Ok(()) => {
                state.records.remove(&address);
                report.record(KIND_RECORD_SET, address, Action::Deleted);
            }
            Err(e) => report.fail(KIND_RECORD_SET, address, e),
        }
    }
}

async fn delete_zones<A: DnsApi + ?Sized>(
    api: &A,
    state: &mut StateFile,
    names: Vec<String>,
    options: &ApplyOptions,
    report: &mut ApplyReport,
) {
    for name in names {
        let remaining = state.records.values().filter(|r| r.zone == name).count();
        if remaining > 0 {
            warn!(zone = %name, remaining = remaining, "Zone still has managed record sets in state");
        }
        match zones::delete_zone(api, &name, options.force_zone_delete, &options.poll).await {
            Ok(()) => {
                state.zones.remove(&name);
                report.record(KIND_ZONE, name, Action::Deleted);
            }
            Err(e) => report.fail(KIND_ZONE, name, e),
        }
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Bring the API and `state` in line with `manifest`.
///
/// `state` is updated in place for every resource that succeeded; the caller
/// persists it whether or not the report is a success.
pub async fn apply<A: DnsApi + ?Sized>(
    api: &A,
    manifest: &Manifest,
    state: &mut StateFile,
    options: &ApplyOptions,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for desired in &manifest.zones {
        let prior = state.zones.get(&desired.zone);
        match reconcile_zone(api, desired, prior).await {
            Ok((zone_state, action)) => {
                state.zones.insert(desired.zone.clone(), zone_state);
                report.record(KIND_ZONE, desired.zone.clone(), action);
            }
            Err(e) => report.fail(KIND_ZONE, desired.zone.clone(), e),
        }
    }

    let results: Vec<(String, Result<(RecordState, Action), DnsError>)> = {
        let snapshot = &*state;
        stream::iter(&manifest.records)
            .map(|entry| async move {
                let address = entry.address();
                let prior = snapshot.records.get(&address);
                let result = reconcile_record(api, entry, prior, &options.poll).await;
                (address, result)
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await
    };
    for (address, result) in results {
        match result {
            Ok((record_state, action)) => {
                state.records.insert(address.clone(), record_state);
                report.record(KIND_RECORD_SET, address, action);
            }
            Err(e) => report.fail(KIND_RECORD_SET, address, e),
        }
    }

    let declared: HashSet<String> = manifest.records.iter().map(RecordEntry::address).collect();
    let orphans: Vec<String> = state
        .records
        .keys()
        .filter(|address| !declared.contains(*address))
        .cloned()
        .collect();
    delete_records(api, state, orphans, options, &mut report).await;

    let orphan_zones: Vec<String> = state
        .zones
        .keys()
        .filter(|zone| !manifest.declares_zone(zone))
        .cloned()
        .collect();
    delete_zones(api, state, orphan_zones, options, &mut report).await;

    report
}

/// Delete every resource tracked in `state`, record sets first.
pub async fn destroy<A: DnsApi + ?Sized>(
    api: &A,
    state: &mut StateFile,
    options: &ApplyOptions,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    let addresses: Vec<String> = state.records.keys().cloned().collect();
    delete_records(api, state, addresses, options, &mut report).await;

    let names: Vec<String> = state.zones.keys().cloned().collect();
    delete_zones(api, state, names, options, &mut report).await;

    report
}

/// Refresh `state` from the API without changing anything remotely.
///
/// Resources that no longer exist are dropped from state.
pub async fn refresh<A: DnsApi + ?Sized>(api: &A, state: &mut StateFile) -> ApplyReport {
    let mut report = ApplyReport::default();

    let names: Vec<String> = state.zones.keys().cloned().collect();
    for name in names {
        match zones::read_zone(api, &name).await {
            Ok(Some(live)) => {
                state.zones.insert(name.clone(), live);
                report.record(KIND_ZONE, name, Action::Unchanged);
            }
            Ok(None) => {
                state.zones.remove(&name);
                report.record(KIND_ZONE, name, Action::Dropped);
            }
            Err(e) => report.fail(KIND_ZONE, name, e),
        }
    }

    let addresses: Vec<String> = state.records.keys().cloned().collect();
    for address in addresses {
        let Some(prior) = state.records.get(&address) else {
            continue;
        };
        let result = match prior.record_id() {
            Ok(id) => records::read_record(api, &id, None).await.map(|live| {
                live.map(|mut live| {
                    live.rdata =
                        rdata::preserve_spelling(&live.record_type, live.rdata, &prior.rdata);
                    live.name = prior.name.clone();
                    live
                })
            }),
            Err(e) => Err(e),
        };
        match result {
            Ok(Some(live)) => {
                state.records.insert(address.clone(), live);
                report.record(KIND_RECORD_SET, address, Action::Unchanged);
            }
            Ok(None) => {
                state.records.remove(&address);
                report.record(KIND_RECORD_SET, address, Action::Dropped);
            }
            Err(e) => report.fail(KIND_RECORD_SET, address, e),
        }
    }

    report
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod apply_tests;
