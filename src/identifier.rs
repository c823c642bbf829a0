// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persisted identity of a record set.
//!
//! A record set is identified by the triple (zone, canonical name, type). The
//! triple is flattened into a single string for the state file and for
//! import, and parsed back on read.
//!
//! # Format
//!
//! ```text
//! example.com|www.example.com|A
//! ```
//!
//! Identifiers written by older releases joined the fields with `_`
//! (`example.com_www.example.com_A`). Those still decode as long as they
//! contain no `|` and split into exactly three parts; names containing
//! underscores (`_dmarc`, `_sip._tcp`) are only representable in the new form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{LEGACY_RECORD_ID_SEPARATOR, RECORD_ID_SEPARATOR};
use crate::errors::IdentifierError;
use crate::naming::{canonicalize, strip_terminator};

/// Decoded record-set identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Owning zone
    pub zone: String,
    /// Canonical record name (lower-case, no trailing terminator)
    pub name: String,
    /// Record type mnemonic (e.g. `A`, `TXT`)
    pub record_type: String,
}

impl RecordId {
    /// Build an identity, normalizing the name the same way [`encode`] does.
    ///
    /// The zone loses its trailing terminator and the type is upper-cased.
    pub fn new(
        zone: impl AsRef<str>,
        name: impl AsRef<str>,
        record_type: impl AsRef<str>,
    ) -> Self {
        Self {
            zone: strip_terminator(zone.as_ref()).to_string(),
            name: strip_terminator(name.as_ref()).to_ascii_lowercase(),
            record_type: record_type.as_ref().to_ascii_uppercase(),
        }
    }

    /// The same identity with the name qualified against the zone.
    ///
    /// Hand-written identifiers may carry a relative or mixed-case name; the
    /// API only knows the canonical one.
    #[must_use]
    pub fn canonicalized(&self) -> Self {
        Self::new(
            &self.zone,
            canonicalize(&self.name, &self.zone),
            &self.record_type,
        )
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.zone, &self.name, &self.record_type))
    }
}

impl FromStr for RecordId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Join zone, canonical name and type into a persisted identifier.
///
/// The name is lower-cased and loses one trailing terminator.
///
/// # Examples
///
/// ```
/// use zonekeeper::identifier::encode;
///
/// assert_eq!(encode("example.com", "WWW.example.com.", "A"), "example.com|www.example.com|A");
/// ```
#[must_use]
pub fn encode(zone: &str, canonical_name: &str, record_type: &str) -> String {
    let name = strip_terminator(canonical_name).to_ascii_lowercase();
    format!("{zone}{RECORD_ID_SEPARATOR}{name}{RECORD_ID_SEPARATOR}{record_type}")
}

/// Split a persisted identifier back into zone, name and type.
///
/// # Errors
///
/// Returns [`IdentifierError::Malformed`] if the identifier does not split into
/// exactly three non-empty parts.
pub fn decode(id: &str) -> Result<RecordId, IdentifierError> {
    let separator = if id.contains(RECORD_ID_SEPARATOR) {
        RECORD_ID_SEPARATOR
    } else {
        LEGACY_RECORD_ID_SEPARATOR
    };

    let parts: Vec<&str> = id.split(separator).collect();
    let [zone, name, record_type] = parts.as_slice() else {
        return Err(IdentifierError::Malformed {
            id: id.to_string(),
            reason: format!("expected 3 parts, found {}", parts.len()),
        });
    };

    let name = strip_terminator(name);
    if zone.is_empty() || name.is_empty() || record_type.is_empty() {
        return Err(IdentifierError::Malformed {
            id: id.to_string(),
            reason: "zone, name and type must all be non-empty".to_string(),
        });
    }

    Ok(RecordId {
        zone: (*zone).to_string(),
        name: name.to_string(),
        record_type: (*record_type).to_string(),
    })
}

#[cfg(test)]
#[path = "identifier_tests.rs"]
mod identifier_tests;
