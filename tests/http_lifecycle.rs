// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end lifecycle tests against a mock Edge DNS API.
//!
//! These drive the public lifecycle functions through the real HTTP client,
//! with wiremock standing in for the remote side.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zonekeeper::api::http::HttpDnsApi;
use zonekeeper::config::ClientConfig;
use zonekeeper::errors::DnsError;
use zonekeeper::poller::PollConfig;
use zonekeeper::records::{create_record, import_record, RecordConfig};
use zonekeeper::zones::{create_zone, delete_zone, ZoneConfig};

// ============================================================================
// Helper Functions
// ============================================================================

fn api(server: &MockServer) -> HttpDnsApi {
    let config = ClientConfig::new(&server.uri(), Some("token".to_string())).unwrap();
    HttpDnsApi::new(&config).unwrap()
}

fn fast_poll() -> PollConfig {
    PollConfig::new(Duration::from_secs(10), Duration::from_millis(20))
}

async fn mount_zone(server: &MockServer, zone: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/config-dns/v2/zones/{zone}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zone": zone,
            "type": "PRIMARY",
            "comment": "Managed by automation",
            "contractId": "C-1",
            "signAndServe": false,
            "activationState": "ACTIVE"
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn create_zone_opens_and_submits_change_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/config-dns/v2/zones"))
        .and(query_param("contractId", "C-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"zone": "example.com"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/config-dns/v2/changelists"))
        .and(query_param("zone", "example.com"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"zone": "example.com", "stale": false})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/config-dns/v2/changelists/example.com/submit"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_zone(&server, "example.com").await;

    let state = create_zone(&api(&server), &ZoneConfig::new("example.com", "C-1"))
        .await
        .unwrap();
    assert_eq!(state.id, "example.com");
    assert_eq!(state.activation_state.as_deref(), Some("ACTIVE"));
}

#[tokio::test]
async fn create_record_retries_conflict_then_succeeds() {
    let server = MockServer::start().await;
    mount_zone(&server, "example.com").await;

    let record_path = "/config-dns/v2/zones/example.com/names/www.example.com/types/TXT";
    Mock::given(method("POST"))
        .and(path(record_path))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "title": "Conflict",
            "detail": "zone has a pending change list"
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(record_path))
        .and(wiremock::matchers::body_json(json!({
            "name": "www.example.com",
            "type": "TXT",
            "ttl": 300,
            "rdata": ["\"hello world\""]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "name": "www.example.com",
            "type": "TXT",
            "ttl": 300,
            "rdata": ["\"hello world\""]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = RecordConfig {
        zone: "example.com".to_string(),
        name: "WWW".to_string(),
        record_type: "TXT".to_string(),
        ttl: 300,
        rdata: vec!["hello world".to_string()],
    };
    let state = create_record(&api(&server), &record, &fast_poll())
        .await
        .unwrap();
    assert_eq!(state.id, "example.com|www.example.com|TXT");

    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 3);
}

#[tokio::test]
async fn create_record_times_out_on_persistent_server_errors() {
    let server = MockServer::start().await;
    mount_zone(&server, "example.com").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let record = RecordConfig {
        zone: "example.com".to_string(),
        name: "www".to_string(),
        record_type: "A".to_string(),
        ttl: 300,
        rdata: vec!["192.0.2.1".to_string()],
    };
    let poll = PollConfig::new(Duration::from_millis(200), Duration::from_millis(50));
    let err = create_record(&api(&server), &record, &poll)
        .await
        .unwrap_err();

    assert!(matches!(err, DnsError::Timeout(_)));
    assert_eq!(err.status_reason(), "OperationTimedOut");
}

#[tokio::test]
async fn delete_zone_waits_for_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/config-dns/v2/zones/delete-requests"))
        .and(query_param("force", "false"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"requestId": "r-42"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config-dns/v2/zones/delete-requests/r-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestId": "r-42",
            "isComplete": false
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config-dns/v2/zones/delete-requests/r-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestId": "r-42",
            "isComplete": true,
            "zonesSubmitted": 1,
            "successCount": 1,
            "failureCount": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    delete_zone(&api(&server), "example.com", false, &fast_poll())
        .await
        .unwrap();
}

#[tokio::test]
async fn import_record_reads_relative_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/config-dns/v2/zones/example.com/names/alias.example.com/types/CNAME",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "alias.example.com",
            "type": "CNAME",
            "ttl": 600,
            "rdata": ["target.example.net"]
        })))
        .mount(&server)
        .await;

    let state = import_record(&api(&server), "example.com|alias.example.com|CNAME")
        .await
        .unwrap();
    assert_eq!(state.name, "alias");
    assert_eq!(state.ttl, 600);
    assert_eq!(state.rdata, vec!["target.example.net"]);

    let err = import_record(&api(&server), "example.com_alias")
        .await
        .unwrap_err();
    assert_eq!(err.status_reason(), "MalformedIdentifier");
}
