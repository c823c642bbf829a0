// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP implementation of [`DnsApi`] on top of `reqwest`.
//!
//! Each trait method maps to exactly one HTTP request. Retries are not done
//! here; callers wrap calls in [`crate::poller::poll`] where the operation is
//! safe to repeat.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use super::{
    ApiResponse, ApiResult, ChangeList, DnsApi, RecordSet, Zone, ZoneDeleteRequest,
    ZoneDeleteResponse, ZoneDeleteStatus, ZoneRequest,
};
use crate::config::ClientConfig;
use crate::constants::API_BASE_PATH;
use crate::errors::ApiError;
use crate::identifier::RecordId;

/// Error document returned by the API on failures (`application/problem+json`).
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Extract a human-readable message from an error response body.
///
/// Falls back to the raw body when it is not a problem document.
pub(crate) fn problem_message(status: StatusCode, body: &str) -> String {
    let problem: Problem = serde_json::from_str(body).unwrap_or_default();
    match (problem.title, problem.detail) {
        (Some(title), Some(detail)) => format!("{title}: {detail}"),
        (Some(text), None) | (None, Some(text)) => text,
        (None, None) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        (None, None) => body.trim().to_string(),
    }
}

/// DNS control-plane API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDnsApi {
    client: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl HttpDnsApi {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed or the base
    /// URL cannot carry a path.
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        if config.api_url.cannot_be_a_base() {
            anyhow::bail!("API URL '{}' cannot carry a path", config.api_url);
        }
        let client = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
        })
    }

    /// Build the URL of an API resource from path segments.
    ///
    /// Segments are percent-encoded individually, so a record name can never
    /// escape its path position.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(API_BASE_PATH.split('/'))
                .extend(segments);
        }
        url
    }

    fn record_endpoint(&self, zone: &str, name: &str, record_type: &str) -> Url {
        self.endpoint(&["zones", zone, "names", name, "types", record_type])
    }

    /// Send one request and return the status with the raw body.
    ///
    /// Non-2xx statuses become an [`ApiError`] carrying the status and the
    /// problem message; transport failures carry no status.
    async fn send<B: Serialize + std::fmt::Debug + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<(StatusCode, String), ApiError> {
        debug!(
            method = %method,
            url = %url,
            body = ?body,
            auth_enabled = self.token.is_some(),
            "DNS API request"
        );

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(method = %method, url = %url, error = %e, "DNS API request could not be sent");
            ApiError::transport(format!("failed to send {method} {url}: {e}"))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ApiError::from_status(status, format!("failed to read response body: {e}"))
        })?;

        if !status.is_success() {
            let message = problem_message(status, &text);
            debug!(
                method = %method,
                url = %url,
                status = %status,
                error = %message,
                "DNS API request failed"
            );
            return Err(ApiError::from_status(status, message));
        }

        debug!(
            method = %method,
            url = %url,
            status = %status,
            response_len = text.len(),
            "DNS API request successful"
        );
        Ok((status, text))
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + std::fmt::Debug + Sync,
        T: DeserializeOwned,
    {
        let (status, text) = self.send(method, url, body).await?;
        let decoded = serde_json::from_str(&text).map_err(|e| {
            ApiError::from_status(status, format!("failed to decode response body: {e}"))
        })?;
        Ok(ApiResponse::new(status, decoded))
    }

    async fn send_empty<B>(&self, method: Method, url: Url, body: Option<&B>) -> ApiResult<()>
    where
        B: Serialize + std::fmt::Debug + Sync,
    {
        let (status, _) = self.send(method, url, body).await?;
        Ok(ApiResponse::new(status, ()))
    }
}

#[async_trait]
impl DnsApi for HttpDnsApi {
    async fn get_zone(&self, zone: &str) -> ApiResult<Zone> {
        let url = self.endpoint(&["zones", zone]);
        self.send_json(Method::GET, url, None::<&()>).await
    }

    async fn create_zone(&self, contract_id: &str, request: &ZoneRequest) -> ApiResult<Zone> {
        let mut url = self.endpoint(&["zones"]);
        url.query_pairs_mut().append_pair("contractId", contract_id);
        self.send_json(Method::POST, url, Some(request)).await
    }

    async fn update_zone(&self, request: &ZoneRequest) -> ApiResult<Zone> {
        let url = self.endpoint(&["zones", &request.zone]);
        self.send_json(Method::PUT, url, Some(request)).await
    }

    async fn delete_zone(
        &self,
        request: &ZoneDeleteRequest,
        force: bool,
    ) -> ApiResult<ZoneDeleteResponse> {
        let mut url = self.endpoint(&["zones", "delete-requests"]);
        url.query_pairs_mut()
            .append_pair("force", if force { "true" } else { "false" });
        self.send_json(Method::POST, url, Some(request)).await
    }

    async fn delete_zone_status(&self, request_id: &str) -> ApiResult<ZoneDeleteStatus> {
        let url = self.endpoint(&["zones", "delete-requests", request_id]);
        self.send_json(Method::GET, url, None::<&()>).await
    }

    async fn create_change_list(&self, zone: &str) -> ApiResult<ChangeList> {
        let mut url = self.endpoint(&["changelists"]);
        url.query_pairs_mut().append_pair("zone", zone);
        self.send_json(Method::POST, url, None::<&()>).await
    }

    async fn submit_change_list(&self, zone: &str) -> ApiResult<()> {
        let url = self.endpoint(&["changelists", zone, "submit"]);
        self.send_empty(Method::POST, url, None::<&()>).await
    }

    async fn get_record_set(&self, id: &RecordId) -> ApiResult<RecordSet> {
        let url = self.record_endpoint(&id.zone, &id.name, &id.record_type);
        self.send_json(Method::GET, url, None::<&()>).await
    }

    async fn create_record_set(&self, zone: &str, record: &RecordSet) -> ApiResult<RecordSet> {
        let url = self.record_endpoint(zone, &record.name, &record.record_type);
        self.send_json(Method::POST, url, Some(record)).await
    }

    async fn update_record_set(&self, zone: &str, record: &RecordSet) -> ApiResult<RecordSet> {
        let url = self.record_endpoint(zone, &record.name, &record.record_type);
        self.send_json(Method::PUT, url, Some(record)).await
    }

    async fn delete_record_set(&self, id: &RecordId) -> ApiResult<()> {
        let url = self.record_endpoint(&id.zone, &id.name, &id.record_type);
        self.send_empty(Method::DELETE, url, None::<&()>).await
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
