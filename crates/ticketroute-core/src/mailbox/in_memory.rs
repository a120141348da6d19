//! In-memory mailbox backend.
//!
//! Behaves like a single user's remote mailbox: a folder tree, inbox rules,
//! and messages filed in folders. Every call is journaled so tests can
//! assert which remote operations an operation issued, and failures can be
//! injected per call kind.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{MailFolder, MailboxApi, MessageRef, MessageRule, RuleDraft};
use crate::error::{RemoteError, RemoteResult};

/// Kind of remote call, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailboxCall {
    /// [`MailboxApi::find_top_level_folder`].
    FindTopLevelFolder,
    /// [`MailboxApi::find_child_folders`].
    FindChildFolders,
    /// [`MailboxApi::list_child_folders`].
    ListChildFolders,
    /// [`MailboxApi::create_child_folder`].
    CreateChildFolder,
    /// [`MailboxApi::list_rules`].
    ListRules,
    /// [`MailboxApi::create_rule`].
    CreateRule,
    /// [`MailboxApi::replace_rule`].
    ReplaceRule,
    /// [`MailboxApi::set_rule_enabled`].
    SetRuleEnabled,
    /// [`MailboxApi::move_message`].
    MoveMessage,
    /// [`MailboxApi::copy_message`].
    CopyMessage,
    /// [`MailboxApi::list_messages`].
    ListMessages,
}

impl MailboxCall {
    /// Whether the call changes remote state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateChildFolder
                | Self::CreateRule
                | Self::ReplaceRule
                | Self::SetRuleEnabled
                | Self::MoveMessage
                | Self::CopyMessage
        )
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    folder_id: String,
    subject: String,
}

#[derive(Debug, Default)]
struct State {
    folders: Vec<MailFolder>,
    rules: Vec<MessageRule>,
    messages: Vec<StoredMessage>,
    next_id: u64,
    calls: Vec<MailboxCall>,
    failures: HashMap<MailboxCall, RemoteError>,
}

impl State {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }

    fn record(&mut self, call: MailboxCall) -> RemoteResult<()> {
        self.calls.push(call);
        self.failures.remove(&call).map_or(Ok(()), Err)
    }

    fn add_folder(&mut self, parent_id: Option<&str>, name: &str) -> MailFolder {
        let folder = MailFolder {
            id: self.next_id("folder"),
            display_name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        self.folders.push(folder.clone());
        folder
    }

    fn has_folder(&self, id: &str) -> bool {
        self.folders.iter().any(|f| f.id == id)
    }

    fn children(&self, parent_id: &str) -> impl Iterator<Item = &MailFolder> {
        self.folders
            .iter()
            .filter(move |f| f.parent_id.as_deref() == Some(parent_id))
    }

    fn rule_mut(&mut self, rule_id: &str) -> RemoteResult<&mut MessageRule> {
        self.rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| not_found(format!("Rule {rule_id} not found")))
    }
}

fn not_found(message: impl Into<String>) -> RemoteError {
    RemoteError::new(message)
        .with_status(404)
        .with_code("ErrorItemNotFound")
}

/// Mailbox held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryMailbox {
    state: Mutex<State>,
}

impl InMemoryMailbox {
    /// Creates a mailbox with the usual `Inbox` and `Sent Items` top-level folders.
    #[must_use]
    pub fn new() -> Self {
        let mailbox = Self::empty();
        {
            let mut state = mailbox.state();
            state.add_folder(None, "Inbox");
            state.add_folder(None, "Sent Items");
        }
        mailbox
    }

    /// Creates a mailbox with no folders at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a folder directly, without journaling a call.
    pub fn add_folder(&self, parent_id: Option<&str>, name: &str) -> MailFolder {
        self.state().add_folder(parent_id, name)
    }

    /// Files a new message with `subject` into `folder_id`; returns its id.
    pub fn deliver(&self, folder_id: &str, subject: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("msg");
        state.messages.push(StoredMessage {
            id: id.clone(),
            folder_id: folder_id.to_string(),
            subject: subject.to_string(),
        });
        id
    }

    /// Files a new message into the top-level `Inbox`.
    ///
    /// Falls back to an unfiled message when the mailbox has no inbox.
    pub fn deliver_to_inbox(&self, subject: &str) -> String {
        let inbox = self.folder_at(&["Inbox"]).map(|f| f.id).unwrap_or_default();
        self.deliver(&inbox, subject)
    }

    /// Files a new message into the top-level `Sent Items`.
    pub fn deliver_to_sent_items(&self, subject: &str) -> String {
        let sent = self
            .folder_at(&["Sent Items"])
            .map(|f| f.id)
            .unwrap_or_default();
        self.deliver(&sent, subject)
    }

    /// Resolves a folder by display-name path from the top level.
    ///
    /// Returns the first match at each level.
    #[must_use]
    pub fn folder_at(&self, path: &[&str]) -> Option<MailFolder> {
        let state = self.state();
        let mut parent: Option<&MailFolder> = None;
        for segment in path {
            let found = state.folders.iter().find(|f| {
                f.display_name == *segment
                    && f.parent_id.as_deref() == parent.map(|p| p.id.as_str())
            })?;
            parent = Some(found);
        }
        parent.cloned()
    }

    /// All direct children of a folder.
    #[must_use]
    pub fn children_of(&self, parent_id: &str) -> Vec<MailFolder> {
        self.state().children(parent_id).cloned().collect()
    }

    /// Total number of folders.
    #[must_use]
    pub fn folder_count(&self) -> usize {
        self.state().folders.len()
    }

    /// Ids of the messages currently filed in `folder_id`.
    #[must_use]
    pub fn messages_in(&self, folder_id: &str) -> Vec<String> {
        self.state()
            .messages
            .iter()
            .filter(|m| m.folder_id == folder_id)
            .map(|m| m.id.clone())
            .collect()
    }

    /// Folder a message is filed in, if the message exists.
    #[must_use]
    pub fn folder_of(&self, message_id: &str) -> Option<String> {
        self.state()
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.folder_id.clone())
    }

    /// Snapshot of all inbox rules.
    #[must_use]
    pub fn rules(&self) -> Vec<MessageRule> {
        self.state().rules.clone()
    }

    /// Rules whose display name equals `name`.
    #[must_use]
    pub fn rules_named(&self, name: &str) -> Vec<MessageRule> {
        self.state()
            .rules
            .iter()
            .filter(|r| r.display_name == name)
            .cloned()
            .collect()
    }

    /// Journal of every remote call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MailboxCall> {
        self.state().calls.clone()
    }

    /// Clears the call journal.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Makes the next call of kind `call` fail with `error`.
    pub fn fail_next(&self, call: MailboxCall, error: RemoteError) {
        self.state().failures.insert(call, error);
    }
}

#[async_trait]
impl MailboxApi for InMemoryMailbox {
    async fn find_top_level_folder(&self, name: &str) -> RemoteResult<Option<MailFolder>> {
        let mut state = self.state();
        state.record(MailboxCall::FindTopLevelFolder)?;
        Ok(state
            .folders
            .iter()
            .find(|f| f.parent_id.is_none() && f.display_name == name)
            .cloned())
    }

    async fn find_child_folders(
        &self,
        parent_id: &str,
        name: &str,
    ) -> RemoteResult<Vec<MailFolder>> {
        let mut state = self.state();
        state.record(MailboxCall::FindChildFolders)?;
        if !state.has_folder(parent_id) {
            return Err(not_found(format!("Folder {parent_id} not found")));
        }
        Ok(state
            .children(parent_id)
            .filter(|f| f.display_name == name)
            .cloned()
            .collect())
    }

    async fn list_child_folders(&self, parent_id: &str) -> RemoteResult<Vec<MailFolder>> {
        let mut state = self.state();
        state.record(MailboxCall::ListChildFolders)?;
        if !state.has_folder(parent_id) {
            return Err(not_found(format!("Folder {parent_id} not found")));
        }
        Ok(state.children(parent_id).cloned().collect())
    }

    async fn create_child_folder(&self, parent_id: &str, name: &str) -> RemoteResult<MailFolder> {
        let mut state = self.state();
        state.record(MailboxCall::CreateChildFolder)?;
        if !state.has_folder(parent_id) {
            return Err(not_found(format!("Folder {parent_id} not found")));
        }
        Ok(state.add_folder(Some(parent_id), name))
    }

    async fn list_rules(&self) -> RemoteResult<Vec<MessageRule>> {
        let mut state = self.state();
        state.record(MailboxCall::ListRules)?;
        Ok(state.rules.clone())
    }

    async fn create_rule(&self, draft: &RuleDraft) -> RemoteResult<MessageRule> {
        let mut state = self.state();
        state.record(MailboxCall::CreateRule)?;
        let rule = MessageRule {
            id: state.next_id("rule"),
            display_name: draft.display_name.clone(),
            enabled: draft.enabled,
            subject_contains: draft.subject_contains.clone(),
            move_to_folder: Some(draft.move_to_folder.clone()),
            stop_processing_rules: draft.stop_processing_rules,
        };
        state.rules.push(rule.clone());
        Ok(rule)
    }

    async fn replace_rule(&self, rule_id: &str, draft: &RuleDraft) -> RemoteResult<MessageRule> {
        let mut state = self.state();
        state.record(MailboxCall::ReplaceRule)?;
        let rule = state.rule_mut(rule_id)?;
        rule.display_name.clone_from(&draft.display_name);
        rule.enabled = draft.enabled;
        rule.subject_contains.clone_from(&draft.subject_contains);
        rule.move_to_folder = Some(draft.move_to_folder.clone());
        rule.stop_processing_rules = draft.stop_processing_rules;
        Ok(rule.clone())
    }

    async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> RemoteResult<()> {
        let mut state = self.state();
        state.record(MailboxCall::SetRuleEnabled)?;
        state.rule_mut(rule_id)?.enabled = enabled;
        Ok(())
    }

    async fn move_message(
        &self,
        message_id: &str,
        destination_id: &str,
    ) -> RemoteResult<MessageRef> {
        let mut state = self.state();
        state.record(MailboxCall::MoveMessage)?;
        if !state.has_folder(destination_id) {
            return Err(not_found(format!("Folder {destination_id} not found")));
        }
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| not_found(format!("Message {message_id} not found")))?;
        message.folder_id = destination_id.to_string();
        Ok(MessageRef {
            id: message.id.clone(),
        })
    }

    async fn copy_message(
        &self,
        message_id: &str,
        destination_id: &str,
    ) -> RemoteResult<MessageRef> {
        let mut state = self.state();
        state.record(MailboxCall::CopyMessage)?;
        if !state.has_folder(destination_id) {
            return Err(not_found(format!("Folder {destination_id} not found")));
        }
        let subject = state
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.subject.clone())
            .ok_or_else(|| not_found(format!("Message {message_id} not found")))?;
        let id = state.next_id("msg");
        state.messages.push(StoredMessage {
            id: id.clone(),
            folder_id: destination_id.to_string(),
            subject,
        });
        Ok(MessageRef { id })
    }

    async fn list_messages(&self, folder_id: &str, top: usize) -> RemoteResult<Vec<MessageRef>> {
        let mut state = self.state();
        state.record(MailboxCall::ListMessages)?;
        if !state.has_folder(folder_id) {
            return Err(not_found(format!("Folder {folder_id} not found")));
        }
        Ok(state
            .messages
            .iter()
            .filter(|m| m.folder_id == folder_id)
            .take(top)
            .map(|m| MessageRef { id: m.id.clone() })
            .collect())
    }
}
