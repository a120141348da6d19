//! # ticketroute-core
//!
//! Core ticket lifecycle logic for `TicketRoute`.
//!
//! A ticket is identified by the `TrackingID#<digits>` token carried in the
//! subject line of every message that belongs to it. All state lives in the
//! remote mailbox itself:
//!
//! - **Folders** - `Inbox/Cases/Active/<ticket>` while open,
//!   `Inbox/Cases/Closed/<ticket>` once closed
//! - **Mail rules** - one server-side rule named `TKT-<ticket>` that files
//!   future messages into the ticket folder
//!
//! The crate is split bottom-up:
//!
//! - [`tracking`] - pulls the tracking id out of a subject line
//! - [`mailbox`] - the remote mailbox API, plus an in-memory backend
//! - [`folders`] - get-or-create folder provisioning and the close relocation
//! - [`rules`] - rule upsert and non-destructive enable/disable
//! - [`service`] - the four operations exposed to callers
//!
//! ## Example
//!
//! ```
//! use ticketroute_core::{InMemoryMailbox, Status, TicketService};
//!
//! # tokio_test::block_on(async {
//! let mailbox = InMemoryMailbox::new();
//! let message = mailbox.deliver_to_inbox("RE: outage TrackingID#123456789012345");
//!
//! let service = TicketService::new();
//! let outcome = service
//!     .route_selected(&mailbox, &message, "RE: outage TrackingID#123456789012345", None)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(outcome.status, Status::Routed);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod folders;
pub mod mailbox;
pub mod rules;
pub mod service;
mod ticket;
pub mod tracking;

pub use error::{Error, ErrorKind, RemoteError, RemoteResult, Result};
pub use folders::{
    ACTIVE, CASES, CLOSED, ClosedTicket, FolderResolver, INBOX, MESSAGE_PAGE_CAP, OpenTicket,
};
pub use mailbox::{
    InMemoryMailbox, MailFolder, MailboxApi, MailboxCall, MessageRef, MessageRule, RuleDraft,
};
pub use rules::{RuleSynchronizer, UpsertOutcome};
pub use service::{FolderLocks, KeyedLocks, Outcome, Status, TicketLocks, TicketService};
pub use ticket::TicketId;
pub use tracking::extract_tracking_id;
