//! Remote mailbox abstraction.
//!
//! The lifecycle logic only ever talks to the mailbox through
//! [`MailboxApi`]. A handle is an already-authorized client for one user's
//! mailbox; it is passed explicitly into every operation.
//!
//! Two backends exist: the in-memory one in this module (tests, dry runs)
//! and the Microsoft Graph client in `ticketroute-graph`.

mod in_memory;

pub use in_memory::{InMemoryMailbox, MailboxCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// A folder in the remote mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailFolder {
    /// Opaque, stable identifier.
    pub id: String,
    /// Display name, used as the lookup key within a parent.
    pub display_name: String,
    /// Parent folder, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Reference to a message by its opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Message id.
    pub id: String,
}

/// A server-side message rule on the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRule {
    /// Opaque rule id.
    pub id: String,
    /// Display name (`TKT-<ticket>` for ticket rules).
    pub display_name: String,
    /// Whether the rule is active.
    pub enabled: bool,
    /// Subject substrings the rule matches on.
    #[serde(default)]
    pub subject_contains: Vec<String>,
    /// Destination folder id of the move action.
    #[serde(default)]
    pub move_to_folder: Option<String>,
    /// Whether later rules are skipped after this one fires.
    #[serde(default)]
    pub stop_processing_rules: bool,
}

/// Full body of a rule to create or replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    /// Display name.
    pub display_name: String,
    /// Whether the rule is active.
    pub enabled: bool,
    /// Subject substrings the rule matches on.
    pub subject_contains: Vec<String>,
    /// Destination folder id of the move action.
    pub move_to_folder: String,
    /// Whether later rules are skipped after this one fires.
    pub stop_processing_rules: bool,
}

/// Operations the lifecycle logic needs from a remote mailbox.
///
/// Lookups never fail on "not found": they return `None` or an empty list
/// and leave the decision to the caller. Every error is a
/// [`RemoteError`](crate::RemoteError) carrying the backend's own detail.
#[async_trait]
pub trait MailboxApi: Send + Sync {
    /// Finds a top-level folder by exact display name.
    async fn find_top_level_folder(&self, name: &str) -> RemoteResult<Option<MailFolder>>;

    /// Lists children of `parent_id` whose display name equals `name` exactly.
    async fn find_child_folders(&self, parent_id: &str, name: &str)
    -> RemoteResult<Vec<MailFolder>>;

    /// Lists all children of `parent_id`.
    async fn list_child_folders(&self, parent_id: &str) -> RemoteResult<Vec<MailFolder>>;

    /// Creates a child folder under `parent_id`.
    async fn create_child_folder(&self, parent_id: &str, name: &str) -> RemoteResult<MailFolder>;

    /// Lists the rules defined on the inbox.
    async fn list_rules(&self) -> RemoteResult<Vec<MessageRule>>;

    /// Creates a rule on the inbox.
    async fn create_rule(&self, draft: &RuleDraft) -> RemoteResult<MessageRule>;

    /// Overwrites an existing rule with the full `draft` body.
    async fn replace_rule(&self, rule_id: &str, draft: &RuleDraft) -> RemoteResult<MessageRule>;

    /// Changes only the enabled flag of an existing rule.
    async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> RemoteResult<()>;

    /// Moves a message; returns the message as it now exists at the destination.
    async fn move_message(&self, message_id: &str, destination_id: &str)
    -> RemoteResult<MessageRef>;

    /// Copies a message; returns the new copy.
    async fn copy_message(&self, message_id: &str, destination_id: &str)
    -> RemoteResult<MessageRef>;

    /// Lists at most `top` messages of a folder.
    async fn list_messages(&self, folder_id: &str, top: usize) -> RemoteResult<Vec<MessageRef>>;
}
