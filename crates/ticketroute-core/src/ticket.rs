//! Ticket identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator between the ticket id and the optional short name in a folder name.
pub const SHORT_NAME_SEPARATOR: &str = " \u{2013} ";

/// Prefix of every ticket rule's display name.
pub const RULE_PREFIX: &str = "TKT-";

/// Literal token that introduces a tracking id in a subject line.
pub const TRACKING_TOKEN: &str = "TrackingID#";

/// Opaque ticket identifier.
///
/// Usually a run of 15 or more ASCII digits taken from a subject line. Once
/// constructed it is never interpreted as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wraps an already-extracted identifier.
    pub(crate) fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Recovers the id from a ticket folder name, dropping any short name.
    pub(crate) fn from_folder_name(name: &str) -> Self {
        let id = name.split(SHORT_NAME_SEPARATOR).next().unwrap_or(name);
        Self(id.to_string())
    }

    /// Parses a caller-supplied identifier.
    ///
    /// Surrounding whitespace is trimmed. Nothing else about the id is
    /// checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input is blank.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("Enter the TrackingID of the ticket."));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name of the ticket's mail rule: `TKT-<id>`.
    #[must_use]
    pub fn rule_name(&self) -> String {
        format!("{RULE_PREFIX}{}", self.0)
    }

    /// Subject token the ticket's rule matches on: `TrackingID#<id>`.
    #[must_use]
    pub fn tracking_token(&self) -> String {
        format!("{TRACKING_TOKEN}{}", self.0)
    }

    /// Leaf folder name for the ticket.
    ///
    /// A non-blank short name is appended after an en dash; otherwise the
    /// folder is named after the id alone.
    #[must_use]
    pub fn folder_name(&self, short_name: Option<&str>) -> String {
        match short_name.filter(|s| !s.trim().is_empty()) {
            Some(short) => format!("{}{SHORT_NAME_SEPARATOR}{short}", self.0),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
