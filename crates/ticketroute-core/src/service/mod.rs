//! Ticket lifecycle service.
//!
//! Each operation is a short, strictly ordered chain of remote calls over
//! one caller-supplied mailbox handle. Nothing is retried; the first failing
//! call ends the operation with its error. Partial effects (a folder created
//! before a later call failed) are left in place and are harmless on the
//! next attempt because every step is get-or-create.
//!
//! Operations on the same ticket id are serialized through [`TicketLocks`];
//! get-or-create of any folder, including the `Cases`, `Active` and `Closed`
//! branches every ticket shares, is serialized through [`FolderLocks`].
//! Dropping an operation's future cancels it between remote calls; an
//! optional overall deadline can be set with
//! [`TicketService::with_operation_timeout`].

mod locks;
mod outcome;

pub use locks::{FolderLocks, KeyedLocks, TicketLocks};
pub use outcome::{Outcome, Status};

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::folders::FolderResolver;
use crate::mailbox::MailboxApi;
use crate::rules::RuleSynchronizer;
use crate::ticket::TicketId;
use crate::tracking::extract_tracking_id;

/// Orchestrates folder provisioning, rule synchronization and message moves.
///
/// Holds no mailbox state of its own; one instance can serve many users
/// concurrently.
#[derive(Debug, Default)]
pub struct TicketService {
    locks: TicketLocks,
    folder_locks: FolderLocks,
    operation_timeout: Option<Duration>,
}

impl TicketService {
    /// Creates a service with no overall deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds every operation by `timeout`.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Runs `operation` under the configured deadline, if any.
    async fn bounded<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, operation)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => operation.await,
        }
    }

    /// Files a selected message under its ticket.
    ///
    /// Ensures the ticket folder (optionally suffixed with `short_name`),
    /// upserts the ticket rule as enabled and pointing at that folder, then
    /// moves the message into it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `subject` has no tracking id,
    /// [`Error::Integrity`] if the mailbox has no inbox, or the first remote
    /// error.
    pub async fn route_selected<M: MailboxApi + ?Sized>(
        &self,
        mailbox: &M,
        message_id: &str,
        subject: &str,
        short_name: Option<&str>,
    ) -> Result<Outcome> {
        let ticket = extract_tracking_id(subject)
            .ok_or_else(|| Error::validation("No TrackingID found in subject."))?;

        self.bounded(async {
            let _guard = self.locks.lock(&ticket).await;

            let folder_id = FolderResolver::with_locks(mailbox, &self.folder_locks)
                .ensure_ticket_folder(&ticket, short_name)
                .await?;
            RuleSynchronizer::new(mailbox)
                .upsert_rule(&ticket, &folder_id, true)
                .await?;
            mailbox.move_message(message_id, &folder_id).await?;

            info!(ticket = %ticket, folder = %folder_id, message = message_id, "Message routed");
            Ok::<_, Error>(Outcome::status(Status::Routed)
                .with_ticket(ticket.clone())
                .with_folder(folder_id))
        })
        .await
    }

    /// Files a copy of a just-sent message under its ticket.
    ///
    /// A subject without a tracking id is not an error: the outcome is
    /// [`Status::NoTicket`] and no remote call is made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if the mailbox has no inbox, or the first
    /// remote error.
    pub async fn sent_route<M: MailboxApi + ?Sized>(
        &self,
        mailbox: &M,
        message_id: &str,
        subject: &str,
    ) -> Result<Outcome> {
        let Some(ticket) = extract_tracking_id(subject) else {
            debug!("Sent message has no tracking id");
            return Ok(Outcome::status(Status::NoTicket));
        };

        self.bounded(async {
            let _guard = self.locks.lock(&ticket).await;

            let folder_id = FolderResolver::with_locks(mailbox, &self.folder_locks)
                .ensure_ticket_folder(&ticket, None)
                .await?;
            RuleSynchronizer::new(mailbox)
                .upsert_rule(&ticket, &folder_id, true)
                .await?;
            let copy = mailbox.copy_message(message_id, &folder_id).await?;

            info!(ticket = %ticket, folder = %folder_id, copy = %copy.id, "Sent message copied");
            Ok::<_, Error>(Outcome::status(Status::Copied).with_ticket(ticket.clone()))
        })
        .await
    }

    /// Enables or disables a ticket's rule, leaving its routing untouched.
    ///
    /// A ticket without a rule is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `ticket_id` is blank, or the first
    /// remote error.
    pub async fn set_rule_state<M: MailboxApi + ?Sized>(
        &self,
        mailbox: &M,
        ticket_id: &str,
        enable: bool,
    ) -> Result<Outcome> {
        let ticket = TicketId::parse(ticket_id)?;

        self.bounded(async {
            let _guard = self.locks.lock(&ticket).await;

            RuleSynchronizer::new(mailbox)
                .patch_rule_state(&ticket, enable)
                .await?;
            Ok::<_, Error>(Outcome::status(Status::for_rule_state(enable)))
        })
        .await
    }

    /// Closes a ticket.
    ///
    /// Moves the first page of messages from the Active-side folder into a
    /// same-named folder under `Closed`, then disables the ticket rule if
    /// there is one. The rule is never deleted and the emptied Active folder
    /// is left in place.
    ///
    /// `ticket_id` may be a prefix of the folder's id. Once the folder is
    /// found, the relocation runs under the lock of the full id, so it is
    /// serialized with routing for that ticket either way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `ticket_id` is blank,
    /// [`Error::Integrity`] if the inbox or the Active-side ticket folder is
    /// missing, or the first remote error.
    pub async fn close<M: MailboxApi + ?Sized>(
        &self,
        mailbox: &M,
        ticket_id: &str,
    ) -> Result<Outcome> {
        let ticket = TicketId::parse(ticket_id)?;

        self.bounded(async {
            let guard = self.locks.lock(&ticket).await;

            let resolver = FolderResolver::with_locks(mailbox, &self.folder_locks);
            let open = resolver.locate_open_ticket(&ticket).await?;
            let owner = open.ticket_id();
            let (open, _guard) = if owner == ticket {
                (open, guard)
            } else {
                debug!(ticket = %ticket, owner = %owner, "Closing by id prefix");
                drop(guard);
                let guard = self.locks.lock(&owner).await;
                (resolver.locate_open_ticket(&owner).await?, guard)
            };

            let closed = resolver.move_to_closed(open).await?;
            let rule_found = RuleSynchronizer::new(mailbox)
                .patch_rule_state(&ticket, false)
                .await?;

            info!(
                ticket = %ticket,
                folder = %closed.destination.id,
                moved = closed.moved,
                page_full = closed.page_full,
                rule_disabled = rule_found,
                "Ticket closed"
            );
            Ok::<_, Error>(Outcome::status(Status::Closed))
        })
        .await
    }

    /// Closes the ticket named in a subject line.
    ///
    /// Like [`TicketService::sent_route`], a subject without a tracking id is
    /// a successful no-op with [`Status::NoTicket`].
    ///
    /// # Errors
    ///
    /// Same as [`TicketService::close`].
    pub async fn close_from_subject<M: MailboxApi + ?Sized>(
        &self,
        mailbox: &M,
        subject: &str,
    ) -> Result<Outcome> {
        match extract_tracking_id(subject) {
            Some(ticket) => self.close(mailbox, ticket.as_str()).await,
            None => {
                debug!("Close requested for a subject without tracking id");
                Ok(Outcome::status(Status::NoTicket))
            }
        }
    }
}
