// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persisted state between runs.
//!
//! The state file holds, for every managed resource, the stored identifier
//! and the attribute snapshot returned by the last successful operation.
//! Zones are keyed by zone name, record sets by their manifest address.
//! Writes go to a sibling temporary file that is renamed over the target.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::records::RecordState;
use crate::zones::ZoneState;

/// Current state file format version.
pub const STATE_VERSION: u32 = 1;

/// Snapshot of all managed resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    /// Format version
    pub version: u32,
    /// Incremented on every save
    pub serial: u64,
    /// Time of the last save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Zones by zone name
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneState>,
    /// Record sets by manifest address
    #[serde(default)]
    pub records: BTreeMap<String, RecordState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            updated_at: None,
            zones: BTreeMap::new(),
            records: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load state from `path`; a missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// was written by a newer format version.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file, starting empty");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read state {}", path.display()))
            }
        };

        let state: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse state {}", path.display()))?;
        if state.version > STATE_VERSION {
            bail!(
                "state {} has version {}, this release understands up to {STATE_VERSION}",
                path.display(),
                state.version
            );
        }
        Ok(state)
    }

    /// Write state to `path`, bumping the serial and timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub async fn save(&mut self, path: &Path) -> Result<()> {
        self.serial += 1;
        self.updated_at = Some(Utc::now());

        let text = serde_json::to_string_pretty(self).context("failed to serialize state")?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, text)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("failed to replace state {}", path.display()))?;

        debug!(path = %path.display(), serial = self.serial, "State saved");
        Ok(())
    }

    /// Whether no resource is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty() && self.records.is_empty()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
