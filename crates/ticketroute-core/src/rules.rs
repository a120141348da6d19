//! Per-ticket mail rule synchronization.
//!
//! Each ticket owns one inbox rule named `TKT-<ticket>` that moves messages
//! whose subject contains `TrackingID#<ticket>` into the ticket folder and
//! stops further rule processing. Rules are found by exact display name.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::mailbox::{MailboxApi, MessageRule, RuleDraft};
use crate::ticket::TicketId;

/// What [`RuleSynchronizer::upsert_rule`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No rule existed; one was created.
    Created(MessageRule),
    /// An existing rule was overwritten with the desired body.
    Replaced(MessageRule),
}

impl UpsertOutcome {
    /// The rule as it now exists remotely.
    #[must_use]
    pub const fn rule(&self) -> &MessageRule {
        match self {
            Self::Created(rule) | Self::Replaced(rule) => rule,
        }
    }
}

/// Keeps each ticket's inbox rule in the desired state.
#[derive(Debug)]
pub struct RuleSynchronizer<'a, M: ?Sized> {
    mailbox: &'a M,
}

impl<'a, M: MailboxApi + ?Sized> RuleSynchronizer<'a, M> {
    /// Creates a synchronizer over a mailbox handle.
    #[must_use]
    pub const fn new(mailbox: &'a M) -> Self {
        Self { mailbox }
    }

    /// Builds the full rule body for a ticket routed to `folder_id`.
    #[must_use]
    pub fn desired_rule(ticket: &TicketId, folder_id: &str, enable: bool) -> RuleDraft {
        RuleDraft {
            display_name: ticket.rule_name(),
            enabled: enable,
            subject_contains: vec![ticket.tracking_token()],
            move_to_folder: folder_id.to_string(),
            stop_processing_rules: true,
        }
    }

    /// Finds the ticket's rule by exact display name.
    ///
    /// # Errors
    ///
    /// Returns a remote error if the rules cannot be listed.
    pub async fn find_rule(&self, ticket: &TicketId) -> Result<Option<MessageRule>> {
        let name = ticket.rule_name();
        Ok(self
            .mailbox
            .list_rules()
            .await?
            .into_iter()
            .find(|r| r.display_name == name))
    }

    /// Creates the ticket's rule, or overwrites the existing one.
    ///
    /// An existing rule is always replaced with the full desired body, so any
    /// manual change to its condition or target folder is reset.
    ///
    /// # Errors
    ///
    /// Returns a remote error from the list, create or replace call.
    pub async fn upsert_rule(
        &self,
        ticket: &TicketId,
        folder_id: &str,
        enable: bool,
    ) -> Result<UpsertOutcome> {
        let draft = Self::desired_rule(ticket, folder_id, enable);

        let outcome = match self.find_rule(ticket).await? {
            Some(existing) => {
                debug!(rule = %existing.id, name = %draft.display_name, "Replacing rule");
                UpsertOutcome::Replaced(self.mailbox.replace_rule(&existing.id, &draft).await?)
            }
            None => UpsertOutcome::Created(self.mailbox.create_rule(&draft).await?),
        };

        info!(
            rule = %outcome.rule().id,
            name = %draft.display_name,
            enabled = enable,
            folder = folder_id,
            "Rule synchronized"
        );
        Ok(outcome)
    }

    /// Enables or disables the ticket's rule without touching its condition
    /// or action.
    ///
    /// Returns `false` if the ticket has no rule; nothing is created in that
    /// case.
    ///
    /// # Errors
    ///
    /// Returns a remote error from the list or patch call.
    pub async fn patch_rule_state(&self, ticket: &TicketId, enable: bool) -> Result<bool> {
        let Some(rule) = self.find_rule(ticket).await? else {
            warn!(ticket = %ticket, "No rule to update");
            return Ok(false);
        };

        self.mailbox.set_rule_enabled(&rule.id, enable).await?;
        info!(rule = %rule.id, enabled = enable, "Rule state changed");
        Ok(true)
    }
}
