//! Case folder provisioning.
//!
//! Tickets live under a fixed hierarchy below the top-level inbox:
//!
//! ```text
//! Inbox
//! └── Cases
//!     ├── Active
//!     │   └── <ticket> [– <short name>]
//!     └── Closed
//!         └── <ticket> [– <short name>]
//! ```
//!
//! Folders are located by display name on every call; ids are never cached.
//! Get-or-create is a lookup followed by a create, with no atomicity on the
//! remote side. A resolver built with [`FolderResolver::with_locks`] holds a
//! per-`(parent, name)` lock across the pair, so callers sharing one
//! [`FolderLocks`] table never create the same child twice. Callers in other
//! processes still can.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::mailbox::{MailFolder, MailboxApi};
use crate::service::FolderLocks;
use crate::ticket::TicketId;

/// Display name of the top-level inbox.
pub const INBOX: &str = "Inbox";
/// Branch under the inbox that holds all tickets.
pub const CASES: &str = "Cases";
/// Branch holding open tickets.
pub const ACTIVE: &str = "Active";
/// Branch holding closed tickets.
pub const CLOSED: &str = "Closed";

/// Maximum number of messages relocated when a ticket is closed.
///
/// Only the first page is moved; anything beyond it stays in the Active
/// folder.
pub const MESSAGE_PAGE_CAP: usize = 100;

/// Result of relocating a ticket's folder contents to the Closed branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTicket {
    /// The ticket folder found under `Active`.
    pub source: MailFolder,
    /// The folder with the same name under `Closed`.
    pub destination: MailFolder,
    /// Number of messages moved.
    pub moved: usize,
    /// Whether the listing hit [`MESSAGE_PAGE_CAP`], so messages may remain.
    pub page_full: bool,
}

/// An open ticket folder found under `Active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    /// The `Inbox/Cases` folder it was found under.
    pub cases: MailFolder,
    /// The ticket folder itself.
    pub folder: MailFolder,
}

impl OpenTicket {
    /// The full ticket id the folder is named after.
    ///
    /// Differs from the id used for the lookup when that was only a prefix.
    #[must_use]
    pub fn ticket_id(&self) -> TicketId {
        TicketId::from_folder_name(&self.folder.display_name)
    }
}

/// Locates and creates folders in the case hierarchy.
#[derive(Debug)]
pub struct FolderResolver<'a, M: ?Sized> {
    mailbox: &'a M,
    locks: Option<&'a FolderLocks>,
}

impl<'a, M: MailboxApi + ?Sized> FolderResolver<'a, M> {
    /// Creates a resolver over a mailbox handle.
    ///
    /// Get-or-create is not serialized; see [`FolderResolver::with_locks`].
    #[must_use]
    pub const fn new(mailbox: &'a M) -> Self {
        Self {
            mailbox,
            locks: None,
        }
    }

    /// Creates a resolver whose get-or-create steps are serialized through
    /// `locks`.
    #[must_use]
    pub const fn with_locks(mailbox: &'a M, locks: &'a FolderLocks) -> Self {
        Self {
            mailbox,
            locks: Some(locks),
        }
    }

    /// Looks up the top-level inbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if the mailbox has no `Inbox`, or a
    /// remote error if the lookup fails.
    pub async fn inbox(&self) -> Result<MailFolder> {
        self.mailbox
            .find_top_level_folder(INBOX)
            .await?
            .ok_or_else(|| Error::integrity("Inbox not found."))
    }

    /// Returns the child of `parent_id` named exactly `name`, creating it if absent.
    ///
    /// When several children share the name, the first one listed wins.
    ///
    /// # Errors
    ///
    /// Returns a remote error if the lookup or the create fails.
    pub async fn get_or_create_child(&self, parent_id: &str, name: &str) -> Result<MailFolder> {
        let _guard = match self.locks {
            Some(locks) => Some(locks.lock(&(parent_id.to_string(), name.to_string())).await),
            None => None,
        };

        let existing = self.mailbox.find_child_folders(parent_id, name).await?;
        if let Some(folder) = existing.into_iter().next() {
            debug!(folder = %folder.id, name, "Found existing folder");
            return Ok(folder);
        }

        let folder = self.mailbox.create_child_folder(parent_id, name).await?;
        info!(folder = %folder.id, parent = parent_id, name, "Created folder");
        Ok(folder)
    }

    /// Resolves `Inbox/Cases`, creating `Cases` if needed.
    async fn cases(&self) -> Result<MailFolder> {
        let inbox = self.inbox().await?;
        self.get_or_create_child(&inbox.id, CASES).await
    }

    /// Ensures `Inbox/Cases/Active/<leaf>` exists and returns its id.
    ///
    /// The leaf is named `<ticket> – <short name>` when a non-blank short
    /// name is given, otherwise just `<ticket>`. Calling this repeatedly with
    /// the same arguments returns the same folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if there is no inbox, or a remote error.
    pub async fn ensure_ticket_folder(
        &self,
        ticket: &TicketId,
        short_name: Option<&str>,
    ) -> Result<String> {
        let cases = self.cases().await?;
        let active = self.get_or_create_child(&cases.id, ACTIVE).await?;
        let leaf = ticket.folder_name(short_name);
        let folder = self.get_or_create_child(&active.id, &leaf).await?;
        Ok(folder.id)
    }

    /// Finds the open ticket folder under `active_id` by id prefix.
    ///
    /// Matching is by prefix so that a folder created with a short name is
    /// still found from the bare ticket id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if no child name starts with the ticket id.
    pub async fn find_active_ticket_folder(
        &self,
        active_id: &str,
        ticket: &TicketId,
    ) -> Result<MailFolder> {
        self.mailbox
            .list_child_folders(active_id)
            .await?
            .into_iter()
            .find(|f| f.display_name.starts_with(ticket.as_str()))
            .ok_or_else(|| Error::integrity("Ticket folder not found under Active."))
    }

    /// Finds the open ticket folder for `ticket` under `Inbox/Cases/Active`.
    ///
    /// `Cases` and `Active` are created if missing; nothing else is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if the inbox or the ticket folder is
    /// missing, or a remote error.
    pub async fn locate_open_ticket(&self, ticket: &TicketId) -> Result<OpenTicket> {
        let cases = self.cases().await?;
        let active = self.get_or_create_child(&cases.id, ACTIVE).await?;
        let folder = self.find_active_ticket_folder(&active.id, ticket).await?;
        Ok(OpenTicket { cases, folder })
    }

    /// Moves an open ticket's folder contents to `Closed`.
    ///
    /// The Closed-side folder gets the same display name as the Active-side
    /// one, short name included. At most [`MESSAGE_PAGE_CAP`] messages are
    /// moved, one at a time. The emptied Active folder is left in place.
    ///
    /// # Errors
    ///
    /// Returns a remote error from any call.
    pub async fn move_to_closed(&self, open: OpenTicket) -> Result<ClosedTicket> {
        let OpenTicket {
            cases,
            folder: source,
        } = open;

        let closed = self.get_or_create_child(&cases.id, CLOSED).await?;
        let destination = self
            .get_or_create_child(&closed.id, &source.display_name)
            .await?;

        let messages = self
            .mailbox
            .list_messages(&source.id, MESSAGE_PAGE_CAP)
            .await?;
        let page_full = messages.len() >= MESSAGE_PAGE_CAP;

        for message in &messages {
            self.mailbox
                .move_message(&message.id, &destination.id)
                .await?;
        }

        if page_full {
            warn!(
                folder = %source.id,
                "Moved a full page of {MESSAGE_PAGE_CAP} messages; later messages stay in Active"
            );
        }

        Ok(ClosedTicket {
            source,
            destination,
            moved: messages.len(),
            page_full,
        })
    }

    /// Moves a ticket's folder contents from `Active` to `Closed`.
    ///
    /// Same as [`FolderResolver::locate_open_ticket`] followed by
    /// [`FolderResolver::move_to_closed`]. Nothing is created under `Closed`
    /// when the ticket has no Active folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if the inbox or the Active-side ticket
    /// folder is missing, or a remote error from any call.
    pub async fn relocate_to_closed(&self, ticket: &TicketId) -> Result<ClosedTicket> {
        let open = self.locate_open_ticket(ticket).await?;
        self.move_to_closed(open).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mailbox::{InMemoryMailbox, MailboxCall};
    use crate::tracking::extract_tracking_id;

    fn ticket() -> TicketId {
        extract_tracking_id("TrackingID#123456789012345").unwrap()
    }

    #[tokio::test]
    async fn test_missing_inbox_is_integrity_error() {
        let mailbox = InMemoryMailbox::empty();
        let resolver = FolderResolver::new(&mailbox);

        let err = resolver.ensure_ticket_folder(&ticket(), None).await.unwrap_err();
        assert!(matches!(err, Error::Integrity(ref m) if m == "Inbox not found."));
        assert_eq!(mailbox.folder_count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_creates_full_path() {
        let mailbox = InMemoryMailbox::new();
        let resolver = FolderResolver::new(&mailbox);

        let id = resolver.ensure_ticket_folder(&ticket(), None).await.unwrap();

        let leaf = mailbox
            .folder_at(&["Inbox", "Cases", "Active", "123456789012345"])
            .unwrap();
        assert_eq!(leaf.id, id);
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let mailbox = InMemoryMailbox::new();
        let resolver = FolderResolver::new(&mailbox);

        let first = resolver
            .ensure_ticket_folder(&ticket(), Some("VPN"))
            .await
            .unwrap();
        let count = mailbox.folder_count();
        let second = resolver
            .ensure_ticket_folder(&ticket(), Some("VPN"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(mailbox.folder_count(), count);
    }

    #[tokio::test]
    async fn test_short_name_creates_distinct_leaf() {
        let mailbox = InMemoryMailbox::new();
        let resolver = FolderResolver::new(&mailbox);

        let bare = resolver.ensure_ticket_folder(&ticket(), None).await.unwrap();
        let named = resolver
            .ensure_ticket_folder(&ticket(), Some("VPN"))
            .await
            .unwrap();

        assert_ne!(bare, named);
        assert!(
            mailbox
                .folder_at(&["Inbox", "Cases", "Active", "123456789012345 \u{2013} VPN"])
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_get_or_create_returns_first_duplicate() {
        let mailbox = InMemoryMailbox::new();
        let inbox = mailbox.folder_at(&["Inbox"]).unwrap();
        let first = mailbox.add_folder(Some(&inbox.id), "Cases");
        mailbox.add_folder(Some(&inbox.id), "Cases");

        let resolver = FolderResolver::new(&mailbox);
        let found = resolver.get_or_create_child(&inbox.id, "Cases").await.unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_relocate_without_active_folder_creates_nothing_under_closed() {
        let mailbox = InMemoryMailbox::new();
        let resolver = FolderResolver::new(&mailbox);

        let err = resolver.relocate_to_closed(&ticket()).await.unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert!(mailbox.folder_at(&["Inbox", "Cases", "Closed"]).is_none());
        assert!(!mailbox.calls().contains(&MailboxCall::MoveMessage));
    }

    #[tokio::test]
    async fn test_relocate_matches_by_prefix_and_keeps_name() {
        let mailbox = InMemoryMailbox::new();
        let resolver = FolderResolver::new(&mailbox);
        let source_id = resolver
            .ensure_ticket_folder(&ticket(), Some("Printer"))
            .await
            .unwrap();
        mailbox.deliver(&source_id, "a");
        mailbox.deliver(&source_id, "b");

        let closed = resolver.relocate_to_closed(&ticket()).await.unwrap();

        assert_eq!(closed.source.id, source_id);
        assert_eq!(closed.destination.display_name, "123456789012345 \u{2013} Printer");
        assert_eq!(closed.moved, 2);
        assert!(!closed.page_full);
        assert!(mailbox.messages_in(&source_id).is_empty());
        assert_eq!(mailbox.messages_in(&closed.destination.id).len(), 2);
        // The emptied Active folder stays.
        assert!(
            mailbox
                .folder_at(&["Inbox", "Cases", "Active", "123456789012345 \u{2013} Printer"])
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_relocate_moves_only_first_page() {
        let mailbox = InMemoryMailbox::new();
        let resolver = FolderResolver::new(&mailbox);
        let source_id = resolver.ensure_ticket_folder(&ticket(), None).await.unwrap();
        for i in 0..(MESSAGE_PAGE_CAP + 5) {
            mailbox.deliver(&source_id, &format!("msg {i}"));
        }

        let closed = resolver.relocate_to_closed(&ticket()).await.unwrap();

        assert_eq!(closed.moved, MESSAGE_PAGE_CAP);
        assert!(closed.page_full);
        assert_eq!(mailbox.messages_in(&source_id).len(), 5);
    }
}
