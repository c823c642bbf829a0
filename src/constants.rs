// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for zonekeeper.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Resource Kinds
// ============================================================================

/// Kind name used in logs, errors and metrics for zones
pub const KIND_ZONE: &str = "Zone";

/// Kind name used in logs, errors and metrics for record sets
pub const KIND_RECORD_SET: &str = "RecordSet";

// ============================================================================
// Zone Defaults
// ============================================================================

/// Comment attached to zones when the desired state does not set one
pub const DEFAULT_ZONE_COMMENT: &str = "Managed by automation";

// ============================================================================
// Record Identity
// ============================================================================

/// Separator joining zone, canonical name and type in a record identifier.
///
/// `|` is not legal in host names, zone names or type mnemonics, so decoding
/// is unambiguous even when names contain underscores.
pub const RECORD_ID_SEPARATOR: char = '|';

/// Separator used by identifiers persisted before the switch to [`RECORD_ID_SEPARATOR`]
pub const LEGACY_RECORD_ID_SEPARATOR: char = '_';

/// Trailing label terminator of a fully-qualified DNS name
pub const NAME_TERMINATOR: char = '.';

// ============================================================================
// Record Types With Data Transforms
// ============================================================================

/// TXT record type mnemonic
pub const RECORD_TYPE_TXT: &str = "TXT";

/// SPF record type mnemonic (quoted like TXT)
pub const RECORD_TYPE_SPF: &str = "SPF";

/// CNAME record type mnemonic
pub const RECORD_TYPE_CNAME: &str = "CNAME";

// ============================================================================
// Poller Constants
// ============================================================================

/// Default upper bound on a single polled operation (5 minutes)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 300;

/// Default sleep between two attempts of a polled operation (1 second)
pub const DEFAULT_POLL_MIN_INTERVAL_SECS: u64 = 1;

// ============================================================================
// HTTP API Constants
// ============================================================================

/// Path prefix of the DNS configuration API
pub const API_BASE_PATH: &str = "config-dns/v2";

/// Default per-request HTTP timeout
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the API base URL
pub const ENV_API_URL: &str = "ZONEKEEPER_API_URL";

/// Environment variable holding the API bearer token
pub const ENV_API_TOKEN: &str = "ZONEKEEPER_API_TOKEN";

/// Environment variable overriding the poll timeout in seconds
pub const ENV_POLL_TIMEOUT_SECS: &str = "ZONEKEEPER_POLL_TIMEOUT_SECS";

/// Environment variable overriding the poll interval in seconds
pub const ENV_POLL_INTERVAL_SECS: &str = "ZONEKEEPER_POLL_INTERVAL_SECS";

// ============================================================================
// Orchestration Constants
// ============================================================================

/// Maximum number of record sets reconciled concurrently by `apply`
pub const MAX_CONCURRENT_RECORD_OPERATIONS: usize = 8;
