//! Operation results reported to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ticket::TicketId;

/// Status value of a completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The selected message was moved into its ticket folder.
    #[serde(rename = "routed")]
    Routed,
    /// The sent message was copied into its ticket folder.
    #[serde(rename = "copied")]
    Copied,
    /// The subject carried no tracking id; nothing was done.
    #[serde(rename = "no-ticket")]
    NoTicket,
    /// The ticket's rule was enabled (or there was no rule to enable).
    #[serde(rename = "Rule enabled")]
    RuleEnabled,
    /// The ticket's rule was disabled (or there was no rule to disable).
    #[serde(rename = "Rule disabled")]
    RuleDisabled,
    /// The ticket was closed.
    #[serde(rename = "Ticket closed and folder moved to Closed.")]
    Closed,
}

impl Status {
    /// The status text as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Routed => "routed",
            Self::Copied => "copied",
            Self::NoTicket => "no-ticket",
            Self::RuleEnabled => "Rule enabled",
            Self::RuleDisabled => "Rule disabled",
            Self::Closed => "Ticket closed and folder moved to Closed.",
        }
    }

    /// Status for a rule state change.
    #[must_use]
    pub const fn for_rule_state(enable: bool) -> Self {
        if enable {
            Self::RuleEnabled
        } else {
            Self::RuleDisabled
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of a ticket operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Ticket the operation acted on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    /// Ticket folder, for operations that resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Status value.
    pub status: Status,
}

impl Outcome {
    /// An outcome carrying only a status.
    #[must_use]
    pub const fn status(status: Status) -> Self {
        Self {
            ticket_id: None,
            folder_id: None,
            status,
        }
    }

    /// Attaches the ticket id.
    #[must_use]
    pub fn with_ticket(mut self, ticket: TicketId) -> Self {
        self.ticket_id = Some(ticket);
        self
    }

    /// Attaches the folder id.
    #[must_use]
    pub fn with_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tracking::extract_tracking_id;

    #[test]
    fn test_routed_body() {
        let ticket = extract_tracking_id("TrackingID#123456789012345").unwrap();
        let outcome = Outcome::status(Status::Routed)
            .with_ticket(ticket)
            .with_folder("folder-7");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ticketId": "123456789012345",
                "folderId": "folder-7",
                "status": "routed"
            })
        );
    }

    #[test]
    fn test_no_ticket_body_has_only_status() {
        let json = serde_json::to_string(&Outcome::status(Status::NoTicket)).unwrap();
        assert_eq!(json, r#"{"status":"no-ticket"}"#);
    }

    #[test]
    fn test_status_text_matches_serialization() {
        for status in [
            Status::Routed,
            Status::Copied,
            Status::NoTicket,
            Status::RuleEnabled,
            Status::RuleDisabled,
            Status::Closed,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.as_str().into()));
        }
    }
}
