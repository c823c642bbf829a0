// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # zonekeeper - Declarative DNS zone and record-set reconciler
//!
//! zonekeeper drives zones and record sets on an eventually-consistent DNS
//! control-plane API (the Edge DNS `config-dns/v2` REST surface) to a
//! declared desired state. The API answers intermittently with 5xx errors,
//! rejects concurrent edits of sibling records with 409, and deletes zones
//! asynchronously; zonekeeper absorbs all of that within a bounded deadline.
//!
//! ## Modules
//!
//! - [`poller`] - Bounded retry of pending operations
//! - [`naming`] - Record name canonicalization
//! - [`identifier`] - Persisted record-set identifiers
//! - [`rdata`] - Type-specific record data transforms
//! - [`api`] - The `DnsApi` client abstraction and its HTTP implementation
//! - [`zones`] - Zone lifecycle: create, read, update, delete, lookup
//! - [`records`] - Record-set lifecycle: create, read, update, delete, import
//! - [`manifest`], [`state`], [`apply`] - Desired state, persisted state and the run loop
//!
//! ## Example
//!
//! ```rust,no_run
//! use zonekeeper::api::http::HttpDnsApi;
//! use zonekeeper::config::ClientConfig;
//! use zonekeeper::poller::PollConfig;
//! use zonekeeper::records::{create_record, RecordConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let api = HttpDnsApi::new(&ClientConfig::new("https://dns.example.net", None)?)?;
//! let record = RecordConfig {
//!     zone: "example.com".to_string(),
//!     name: "www".to_string(),
//!     record_type: "A".to_string(),
//!     ttl: 300,
//!     rdata: vec!["192.0.2.1".to_string()],
//! };
//! let state = create_record(&api, &record, &PollConfig::default()).await?;
//! assert_eq!(state.id, "example.com|www.example.com|A");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod apply;
pub mod config;
pub mod constants;
pub mod errors;
pub mod http_errors;
pub mod identifier;
pub mod manifest;
pub mod metrics;
pub mod naming;
pub mod poller;
pub mod rdata;
pub mod records;
pub mod state;
pub mod zones;
