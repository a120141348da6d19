//! # ticketroute-graph
//!
//! Microsoft Graph backend for the `TicketRoute` mailbox abstraction.
//!
//! [`GraphClient`] implements [`ticketroute_core::MailboxApi`] over the
//! Graph v1.0 REST API for the signed-in user (`/me`). It expects an access
//! token that has already been obtained by the caller (for example through
//! an on-behalf-of exchange) with `Mail.ReadWrite` and
//! `MailboxSettings.ReadWrite` scopes.
//!
//! ## Features
//!
//! - **Folders** - exact-name child lookup with `OData` `$filter`, paged listing, create
//! - **Rules** - list, create, full replace, enable/disable-only patch on the inbox
//! - **Messages** - move, copy, and capped listing
//! - **Timeouts** - per-request and connect timeouts on every call
//! - **Retry** - exponential backoff for idempotent `GET`s on throttling and server errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use ticketroute_core::TicketService;
//! use ticketroute_graph::{AccessToken, GraphClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GraphClient::new(AccessToken::new("eyJ0eXAi..."))?;
//!     let service = TicketService::new();
//!
//!     let outcome = service
//!         .route_selected(&client, "AAMkAGI2...", "RE: TrackingID#123456789012345", None)
//!         .await?;
//!     println!("{}", outcome.status);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod config;
mod error;
pub mod filter;
pub mod model;
pub mod retry;
pub mod token;

pub use client::GraphClient;
pub use config::{DEFAULT_BASE_URL, GraphConfig, GraphConfigBuilder};
pub use error::{Error, Result};
pub use retry::RetryPolicy;
pub use token::AccessToken;
