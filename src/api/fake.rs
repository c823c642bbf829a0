// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DnsApi`] for tests.
//!
//! Keeps zones and record sets in maps, records every call, and can be
//! scripted to answer the next calls of a method with given statuses before
//! falling back to normal behavior.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{
    ApiResponse, ApiResult, ChangeList, DnsApi, RecordSet, Zone, ZoneDeleteRequest,
    ZoneDeleteResponse, ZoneDeleteStatus, ZoneRequest,
};
use crate::errors::ApiError;
use crate::identifier::RecordId;

/// Scripted answer to one call.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    /// Error response with this status
    Error(u16),
    /// Response with this status and a body, but no error
    Bare(u16),
}

/// One recorded call: method name and the key it addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub key: String,
}

#[derive(Default)]
pub(crate) struct FakeDnsApi {
    zones: Mutex<HashMap<String, Zone>>,
    records: Mutex<HashMap<RecordId, RecordSet>>,
    replies: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    pending_delete_checks: Mutex<u32>,
    stale_change_list: Mutex<bool>,
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

impl FakeDnsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing zone.
    pub fn with_zone(self, zone: &str) -> Self {
        self.zones.lock().unwrap().insert(
            zone.to_string(),
            Zone {
                zone: zone.to_string(),
                zone_type: Some("PRIMARY".into()),
                comment: Some("Managed by automation".into()),
                contract_id: Some("C-1".into()),
                sign_and_serve: Some(false),
                activation_state: Some("ACTIVE".into()),
            },
        );
        self
    }

    /// Seed an existing record set with rdata in remote form.
    pub fn with_record(self, zone: &str, name: &str, record_type: &str, ttl: u32, rdata: &[&str]) -> Self {
        self.records.lock().unwrap().insert(
            RecordId::new(zone, name, record_type),
            RecordSet {
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl,
                rdata: rdata.iter().map(|v| (*v).to_string()).collect(),
            },
        );
        self
    }

    /// Answer the next calls of `method` with `replies`, in order.
    pub fn script(&self, method: &'static str, replies: &[Reply]) {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .extend(replies.iter().copied());
    }

    /// Report the next `checks` delete status checks as not complete.
    pub fn delay_delete_completion(&self, checks: u32) {
        *self.pending_delete_checks.lock().unwrap() = checks;
    }

    /// Report newly opened change lists as stale.
    pub fn make_change_lists_stale(&self) {
        *self.stale_change_list.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn zone(&self, zone: &str) -> Option<Zone> {
        self.zones.lock().unwrap().get(zone).cloned()
    }

    pub fn record(&self, zone: &str, name: &str, record_type: &str) -> Option<RecordSet> {
        self.records
            .lock()
            .unwrap()
            .get(&RecordId::new(zone, name, record_type))
            .cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Record the call and return a scripted reply, if any is queued.
    fn intercept<T>(
        &self,
        method: &'static str,
        key: impl Into<String>,
        body: impl FnOnce() -> T,
    ) -> Option<ApiResult<T>> {
        self.calls.lock().unwrap().push(Call {
            method,
            key: key.into(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)?;
        Some(match reply {
            Reply::Error(code) => Err(ApiError::from_status(status(code), "scripted failure")),
            Reply::Bare(code) => Ok(ApiResponse::new(status(code), body())),
        })
    }

    fn not_found<T>(what: &str) -> ApiResult<T> {
        Err(ApiError::from_status(
            StatusCode::NOT_FOUND,
            format!("{what} not found"),
        ))
    }
}

#[async_trait]
impl DnsApi for FakeDnsApi {
    async fn get_zone(&self, zone: &str) -> ApiResult<Zone> {
        if let Some(reply) = self.intercept("get_zone", zone, Zone::default) {
            return reply;
        }
        match self.zones.lock().unwrap().get(zone) {
            Some(found) => Ok(ApiResponse::new(StatusCode::OK, found.clone())),
            None => Self::not_found(zone),
        }
    }

    async fn create_zone(&self, contract_id: &str, request: &ZoneRequest) -> ApiResult<Zone> {
        if let Some(reply) = self.intercept("create_zone", request.zone.as_str(), Zone::default) {
            return reply;
        }
        let zone = Zone {
            zone: request.zone.clone(),
            zone_type: Some(request.zone_type.clone()),
            comment: Some(request.comment.clone()),
            contract_id: Some(contract_id.to_string()),
            sign_and_serve: Some(request.sign_and_serve),
            activation_state: Some("NEW".into()),
        };
        self.zones
            .lock()
            .unwrap()
            .insert(request.zone.clone(), zone.clone());
        Ok(ApiResponse::new(StatusCode::CREATED, zone))
    }

    async fn update_zone(&self, request: &ZoneRequest) -> ApiResult<Zone> {
        if let Some(reply) = self.intercept("update_zone", request.zone.as_str(), Zone::default) {
            return reply;
        }
        let mut zones = self.zones.lock().unwrap();
        let Some(zone) = zones.get_mut(&request.zone) else {
            return Self::not_found(&request.zone);
        };
        zone.comment = Some(request.comment.clone());
        Ok(ApiResponse::new(StatusCode::OK, zone.clone()))
    }

    async fn delete_zone(
        &self,
        request: &ZoneDeleteRequest,
        _force: bool,
    ) -> ApiResult<ZoneDeleteResponse> {
        let key = request.zones.join(",");
        if let Some(reply) = self.intercept("delete_zone", key.clone(), ZoneDeleteResponse::default) {
            return reply;
        }
        let mut zones = self.zones.lock().unwrap();
        if request.zones.iter().any(|z| !zones.contains_key(z)) {
            return Self::not_found(&key);
        }
        for zone in &request.zones {
            zones.remove(zone);
            self.records.lock().unwrap().retain(|id, _| &id.zone != zone);
        }
        Ok(ApiResponse::new(
            StatusCode::CREATED,
            ZoneDeleteResponse {
                request_id: format!("req-{key}"),
                expiration_date: None,
            },
        ))
    }

    async fn delete_zone_status(&self, request_id: &str) -> ApiResult<ZoneDeleteStatus> {
        if let Some(reply) =
            self.intercept("delete_zone_status", request_id, ZoneDeleteStatus::default)
        {
            return reply;
        }
        let mut pending = self.pending_delete_checks.lock().unwrap();
        let is_complete = *pending == 0;
        *pending = pending.saturating_sub(1);
        Ok(ApiResponse::new(
            StatusCode::OK,
            ZoneDeleteStatus {
                request_id: request_id.to_string(),
                is_complete,
                zones_submitted: 1,
                success_count: u32::from(is_complete),
                failure_count: 0,
            },
        ))
    }

    async fn create_change_list(&self, zone: &str) -> ApiResult<ChangeList> {
        if let Some(reply) = self.intercept("create_change_list", zone, ChangeList::default) {
            return reply;
        }
        Ok(ApiResponse::new(
            StatusCode::CREATED,
            ChangeList {
                zone: zone.to_string(),
                stale: *self.stale_change_list.lock().unwrap(),
                change_tag: Some("tag-1".into()),
                zone_version_id: Some("v1".into()),
            },
        ))
    }

    async fn submit_change_list(&self, zone: &str) -> ApiResult<()> {
        if let Some(reply) = self.intercept("submit_change_list", zone, || ()) {
            return reply;
        }
        Ok(ApiResponse::new(StatusCode::NO_CONTENT, ()))
    }

    async fn get_record_set(&self, id: &RecordId) -> ApiResult<RecordSet> {
        let empty = || RecordSet {
            name: id.name.clone(),
            record_type: id.record_type.clone(),
            ttl: 0,
            rdata: Vec::new(),
        };
        if let Some(reply) = self.intercept("get_record_set", id.to_string(), empty) {
            return reply;
        }
        match self.records.lock().unwrap().get(id) {
            Some(record) => Ok(ApiResponse::new(StatusCode::OK, record.clone())),
            None => Self::not_found(&id.to_string()),
        }
    }

    async fn create_record_set(&self, zone: &str, record: &RecordSet) -> ApiResult<RecordSet> {
        let id = RecordId::new(zone, &record.name, record.record_type.as_str());
        if let Some(reply) = self.intercept("create_record_set", id.to_string(), || record.clone()) {
            return reply;
        }
        if !self.zones.lock().unwrap().contains_key(zone) {
            return Self::not_found(zone);
        }
        self.records.lock().unwrap().insert(id, record.clone());
        Ok(ApiResponse::new(StatusCode::CREATED, record.clone()))
    }

    async fn update_record_set(&self, zone: &str, record: &RecordSet) -> ApiResult<RecordSet> {
        let id = RecordId::new(zone, &record.name, record.record_type.as_str());
        if let Some(reply) = self.intercept("update_record_set", id.to_string(), || record.clone()) {
            return reply;
        }
        let mut records = self.records.lock().unwrap();
        let Some(existing) = records.get_mut(&id) else {
            return Self::not_found(&id.to_string());
        };
        *existing = record.clone();
        Ok(ApiResponse::new(StatusCode::OK, record.clone()))
    }

    async fn delete_record_set(&self, id: &RecordId) -> ApiResult<()> {
        if let Some(reply) = self.intercept("delete_record_set", id.to_string(), || ()) {
            return reply;
        }
        match self.records.lock().unwrap().remove(id) {
            Some(_) => Ok(ApiResponse::new(StatusCode::NO_CONTENT, ())),
            None => Self::not_found(&id.to_string()),
        }
    }
}
