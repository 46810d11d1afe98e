//! Display names for uploaded files
//!
//! Client-supplied filenames are untrusted. The display name keeps ASCII letters and
//! digits and turns every other character into a dot, so `report (final).pdf` becomes
//! `report..final..pdf`: the extension survives while separators, quotes and control
//! characters cannot.

use std::fmt::{Display, Formatter, Result as FmtResult};

use labstore_core::constants::UNKNOWN_EXTENSION;

/// Sanitized name shown to users.
///
/// Invariant: every character is an ASCII letter, an ASCII digit or `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Characters after the last dot, or `unknown` when there are none.
    pub fn extension(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => UNKNOWN_EXTENSION,
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for DisplayName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `.`.
///
/// No length bound is applied. Empty input gives an empty name and punctuation-only
/// input gives a name made only of dots; both are accepted as they are.
pub fn sanitize(raw_name: &str) -> DisplayName {
    DisplayName(
        raw_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '.' })
            .collect(),
    )
}
