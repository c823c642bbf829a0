// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Type-specific record data transforms.
//!
//! The remote API expects TXT and SPF strings wrapped in double quotes and
//! CNAME targets without the trailing terminator. Writes apply these
//! transforms; reads invert them so the values stored in state compare equal
//! to what the user wrote.

use crate::constants::{RECORD_TYPE_CNAME, RECORD_TYPE_SPF, RECORD_TYPE_TXT};
use crate::naming::strip_terminator;

fn is_quoted_type(record_type: &str) -> bool {
    record_type.eq_ignore_ascii_case(RECORD_TYPE_TXT)
        || record_type.eq_ignore_ascii_case(RECORD_TYPE_SPF)
}

fn is_cname(record_type: &str) -> bool {
    record_type.eq_ignore_ascii_case(RECORD_TYPE_CNAME)
}

/// Transform desired rdata into the form the remote API expects.
///
/// Order is preserved.
///
/// # Examples
///
/// ```
/// use zonekeeper::rdata::to_remote;
///
/// assert_eq!(to_remote("TXT", &["v=spf1 -all".to_string()]), vec!["\"v=spf1 -all\""]);
/// assert_eq!(to_remote("CNAME", &["www.example.com.".to_string()]), vec!["www.example.com"]);
/// assert_eq!(to_remote("A", &["192.0.2.1".to_string()]), vec!["192.0.2.1"]);
/// ```
#[must_use]
pub fn to_remote(record_type: &str, values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| {
            if is_quoted_type(record_type) {
                quote_txt(value)
            } else if is_cname(record_type) {
                strip_terminator(value).to_string()
            } else {
                value.clone()
            }
        })
        .collect()
}

/// Invert [`to_remote`] on values read back from the API.
#[must_use]
pub fn from_remote(record_type: &str, values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| {
            if is_quoted_type(record_type) {
                unquote_txt(value).to_string()
            } else if is_cname(record_type) {
                strip_terminator(value).to_string()
            } else {
                value.clone()
            }
        })
        .collect()
}

/// Keep the caller's spelling of CNAME targets that differ from the live
/// value only by the trailing terminator or letter case.
///
/// Any other difference is real drift and the live value wins.
#[must_use]
pub fn preserve_spelling(record_type: &str, live: Vec<String>, desired: &[String]) -> Vec<String> {
    if !is_cname(record_type) || live.len() != desired.len() {
        return live;
    }
    live.into_iter()
        .zip(desired)
        .map(|(live_value, wanted)| {
            if strip_terminator(wanted).eq_ignore_ascii_case(&live_value) {
                wanted.clone()
            } else {
                live_value
            }
        })
        .collect()
}

fn quote_txt(value: &str) -> String {
    format!("\"{value}\"")
}

fn unquote_txt(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
#[path = "rdata_tests.rs"]
mod rdata_tests;
