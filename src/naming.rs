// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record name canonicalization.
//!
//! Users write record names relative to their zone (`www`), as absolute names
//! with (`www.example.com.`) or without (`www.example.com`) the trailing dot,
//! or empty for the zone apex. The remote API and the persisted identifier
//! always use the canonical form: fully qualified, lower-case, no trailing dot.

use crate::constants::NAME_TERMINATOR;

/// Map a user-supplied record name onto its canonical fully-qualified form.
///
/// # Examples
///
/// ```
/// use zonekeeper::naming::canonicalize;
///
/// assert_eq!(canonicalize("www", "example.com"), "www.example.com");
/// assert_eq!(canonicalize("www.", "example.com"), "www.example.com");
/// assert_eq!(canonicalize("", "example.com"), "example.com");
/// assert_eq!(canonicalize("test.example.com", "example.com"), "test.example.com");
/// assert_eq!(canonicalize("test.example.com.", "example.com"), "test.example.com");
/// ```
#[must_use]
pub fn canonicalize(name: &str, zone_name: &str) -> String {
    let name = strip_terminator(name).to_ascii_lowercase();
    let zone = strip_terminator(zone_name).to_ascii_lowercase();

    if is_within_zone(&name, &zone) {
        name
    } else if name.is_empty() {
        zone
    } else {
        format!("{name}{NAME_TERMINATOR}{zone}")
    }
}

/// Express a canonical name relative to its zone.
///
/// Returns an empty string for the zone apex. Names outside the zone are
/// returned unchanged (canonicalized).
///
/// # Examples
///
/// ```
/// use zonekeeper::naming::relative_name;
///
/// assert_eq!(relative_name("www.example.com", "example.com"), "www");
/// assert_eq!(relative_name("example.com.", "example.com"), "");
/// assert_eq!(relative_name("other.org", "example.com"), "other.org");
/// ```
#[must_use]
pub fn relative_name(fqdn: &str, zone_name: &str) -> String {
    let fqdn = strip_terminator(fqdn).to_ascii_lowercase();
    let zone = strip_terminator(zone_name).to_ascii_lowercase();

    if fqdn == zone {
        return String::new();
    }
    match fqdn.strip_suffix(&zone) {
        Some(prefix) if prefix.ends_with(NAME_TERMINATOR) => {
            prefix.trim_end_matches(NAME_TERMINATOR).to_string()
        }
        _ => fqdn,
    }
}

/// Strip a single trailing terminator, if present.
#[must_use]
pub fn strip_terminator(name: &str) -> &str {
    name.strip_suffix(NAME_TERMINATOR).unwrap_or(name)
}

/// A name is taken as already qualified when it ends with the zone name.
///
/// The match is a plain suffix test, not a label match: `fooexample.com` is
/// left as is in zone `example.com`. Persisted identifiers depend on this.
fn is_within_zone(name: &str, zone: &str) -> bool {
    !name.is_empty() && name.ends_with(zone)
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
