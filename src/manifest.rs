// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state document.
//!
//! A manifest lists the zones and record sets that should exist:
//!
//! ```yaml
//! zones:
//!   - zone: example.com
//!     contractId: C-1A2B3C
//!     type: PRIMARY
//!     comment: Managed by zonekeeper
//! records:
//!   - zone: example.com
//!     name: www
//!     type: A
//!     ttl: 300
//!     rdata: ["192.0.2.1", "192.0.2.2"]
//!   - key: mail-spf
//!     zone: example.com
//!     name: ""
//!     type: TXT
//!     ttl: 3600
//!     rdata: ["v=spf1 mx -all"]
//! ```
//!
//! Each record entry is tracked in state under its address: the optional
//! `key`, or the record identifier when no key is given. Keyed entries can
//! change name or type; the record set is then replaced.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::records::RecordConfig;
use crate::zones::ZoneConfig;

/// One record set entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Stable address of the entry in state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Desired record set
    #[serde(flatten)]
    pub record: RecordConfig,
}

impl RecordEntry {
    /// Address of this entry in state.
    #[must_use]
    pub fn address(&self) -> String {
        self.key
            .clone()
            .unwrap_or_else(|| self.record.record_id().to_string())
    }
}

/// Desired zones and record sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Zones to manage
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    /// Record sets to manage
    #[serde(default)]
    pub records: Vec<RecordEntry>,
}

impl Manifest {
    /// Parse and validate a manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the manifest fails validation.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(text).context("invalid manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read, parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in manifest {}", path.display()))
    }

    /// Check the manifest for entries the API would reject or that collide.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let mut zones = HashSet::new();
        for zone in &self.zones {
            if zone.zone.trim().is_empty() {
                bail!("zone name cannot be empty");
            }
            if zone.contract_id.trim().is_empty() {
                bail!("zone '{}' has no contractId", zone.zone);
            }
            if !zones.insert(zone.zone.to_ascii_lowercase()) {
                bail!("zone '{}' is declared more than once", zone.zone);
            }
        }

        let mut addresses = HashSet::new();
        let mut identities = HashSet::new();
        for entry in &self.records {
            let record = &entry.record;
            if record.zone.trim().is_empty() {
                bail!("record '{}' has no zone", record.name);
            }
            if record.record_type.trim().is_empty() {
                bail!("record '{}' in zone '{}' has no type", record.name, record.zone);
            }
            if record.rdata.is_empty() {
                bail!(
                    "record '{}' ({}) in zone '{}' has no rdata",
                    record.name,
                    record.record_type,
                    record.zone
                );
            }
            if !addresses.insert(entry.address()) {
                bail!("record address '{}' is used more than once", entry.address());
            }
            let id = record.record_id();
            if !identities.insert(id.clone()) {
                bail!("record set '{id}' is declared more than once");
            }
        }
        Ok(())
    }

    /// Whether a zone is declared, ignoring case.
    #[must_use]
    pub fn declares_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z.zone.eq_ignore_ascii_case(zone))
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod manifest_tests;
