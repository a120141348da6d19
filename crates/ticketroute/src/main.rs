//! `TicketRoute` - file Outlook mail into per-ticket case folders.
//!
//! Each subcommand runs one lifecycle operation against the signed-in
//! user's mailbox through Microsoft Graph and prints the outcome as JSON on
//! stdout. Logs go to stderr.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use ticketroute_core::{InMemoryMailbox, MailboxApi, Outcome, TicketService};
use ticketroute_graph::{AccessToken, GraphClient};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Graph access token for the signed-in user
    #[arg(long, env = "TICKETROUTE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Graph API root (defaults to the public v1.0 endpoint)
    #[arg(long, env = "TICKETROUTE_GRAPH_URL")]
    graph_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Deadline for the whole operation in seconds
    #[arg(long)]
    operation_timeout_secs: Option<u64>,

    /// Path to the JSON settings file
    #[arg(short, long, env = "TICKETROUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Dry run against a fresh in-memory mailbox instead of Graph
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Move a message into its ticket folder and point the ticket rule there
    RouteSelected {
        /// Id of the selected message
        #[arg(long)]
        message_id: String,
        /// Subject of the selected message
        #[arg(long)]
        subject: String,
        /// Optional label appended to the ticket folder name
        #[arg(long)]
        short_name: Option<String>,
    },

    /// Copy a sent message into its ticket folder
    SentRoute {
        /// Id of the sent message
        #[arg(long)]
        message_id: String,
        /// Subject of the sent message
        #[arg(long)]
        subject: String,
    },

    /// Enable the ticket rule
    Enable {
        /// Ticket tracking id
        ticket_id: String,
    },

    /// Disable the ticket rule
    Disable {
        /// Ticket tracking id
        ticket_id: String,
    },

    /// Move the ticket folder under Closed and disable its rule
    Close {
        /// Ticket tracking id
        ticket_id: String,
    },

    /// Close the ticket named in a message subject
    CloseSubject {
        /// Subject containing the tracking id
        subject: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ticketroute=info,ticketroute_core=info,ticketroute_graph=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()).await {
        Ok(outcome) => {
            print_json(&serde_json::to_value(&outcome).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            print_json(&error_body(&e));
            ExitCode::FAILURE
        }
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{value}");
}

/// HTTP-style status for a failed run.
fn status_code(err: &anyhow::Error) -> u16 {
    err.downcast_ref::<ticketroute_core::Error>()
        .map_or(500, |e| e.kind().status_code())
}

/// JSON body printed for a failed run. Carries the full cause chain.
fn error_body(err: &anyhow::Error) -> serde_json::Value {
    json!({ "error": format!("{err:#}"), "status": status_code(err) })
}

async fn run(args: Args) -> Result<Outcome> {
    let settings = Settings::load(args.config.as_deref())
        .await?
        .with_overrides(args.graph_url, args.timeout_secs, args.operation_timeout_secs);
    let service = settings.service();

    if args.offline {
        return run_offline(&service, args.command).await;
    }

    let token = args
        .access_token
        .context("no access token: pass --access-token or set TICKETROUTE_ACCESS_TOKEN")?;
    let client = GraphClient::with_config(AccessToken::new(token), settings.graph_config()?)?;
    info!(base_url = %client.config().base_url, "Using Microsoft Graph");

    Ok(dispatch(&service, &client, &args.command).await?)
}

/// Runs the command against an in-memory mailbox holding only `Inbox` and
/// `Sent Items`. Routing commands act on a synthetic message carrying the
/// given subject.
async fn run_offline(service: &TicketService, command: Command) -> Result<Outcome> {
    let mailbox = InMemoryMailbox::new();
    let command = match command {
        Command::RouteSelected {
            subject,
            short_name,
            ..
        } => Command::RouteSelected {
            message_id: mailbox.deliver_to_inbox(&subject),
            subject,
            short_name,
        },
        Command::SentRoute { subject, .. } => Command::SentRoute {
            message_id: mailbox.deliver_to_sent_items(&subject),
            subject,
        },
        other => other,
    };

    let result = dispatch(service, &mailbox, &command).await;
    info!(calls = ?mailbox.calls(), "Offline dry run finished");
    Ok(result?)
}

async fn dispatch<M: MailboxApi + ?Sized>(
    service: &TicketService,
    mailbox: &M,
    command: &Command,
) -> ticketroute_core::Result<Outcome> {
    match command {
        Command::RouteSelected {
            message_id,
            subject,
            short_name,
        } => {
            service
                .route_selected(mailbox, message_id, subject, short_name.as_deref())
                .await
        }
        Command::SentRoute {
            message_id,
            subject,
        } => service.sent_route(mailbox, message_id, subject).await,
        Command::Enable { ticket_id } => service.set_rule_state(mailbox, ticket_id, true).await,
        Command::Disable { ticket_id } => service.set_rule_state(mailbox, ticket_id, false).await,
        Command::Close { ticket_id } => service.close(mailbox, ticket_id).await,
        Command::CloseSubject { subject } => service.close_from_subject(mailbox, subject).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ticketroute_core::Status;

    const SUBJECT: &str = "RE: Outage TrackingID#123456789012345";

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_route_selected() {
        let args = Args::try_parse_from([
            "ticketroute",
            "--offline",
            "route-selected",
            "--message-id",
            "AAMk1",
            "--subject",
            SUBJECT,
            "--short-name",
            "VPN",
        ])
        .unwrap();
        assert!(args.offline);
        assert_eq!(
            args.command,
            Command::RouteSelected {
                message_id: "AAMk1".into(),
                subject: SUBJECT.into(),
                short_name: Some("VPN".into()),
            }
        );
    }

    #[test]
    fn test_parse_state_commands() {
        let args = Args::try_parse_from(["ticketroute", "disable", "123456789012345"]).unwrap();
        assert_eq!(
            args.command,
            Command::Disable {
                ticket_id: "123456789012345".into()
            }
        );
        assert!(Args::try_parse_from(["ticketroute", "enable"]).is_err());
    }

    #[tokio::test]
    async fn test_offline_route_selected() {
        let outcome = run_offline(
            &TicketService::new(),
            Command::RouteSelected {
                message_id: String::new(),
                subject: SUBJECT.into(),
                short_name: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, Status::Routed);
        assert_eq!(
            outcome.ticket_id.as_ref().map(ToString::to_string).as_deref(),
            Some("123456789012345")
        );
    }

    #[tokio::test]
    async fn test_offline_sent_route_without_ticket() {
        let outcome = run_offline(
            &TicketService::new(),
            Command::SentRoute {
                message_id: String::new(),
                subject: "Lunch?".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, Status::NoTicket);
    }

    #[tokio::test]
    async fn test_offline_close_of_unknown_ticket_maps_to_not_found() {
        let err = run_offline(
            &TicketService::new(),
            Command::Close {
                ticket_id: "123456789012345".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(status_code(&err), 404);
    }

    #[tokio::test]
    async fn test_blank_ticket_id_maps_to_bad_request() {
        let err = run_offline(
            &TicketService::new(),
            Command::Enable {
                ticket_id: "  ".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(status_code(&err), 400);
    }

    #[tokio::test]
    async fn test_missing_settings_file_is_reported() {
        let args = Args::try_parse_from([
            "ticketroute",
            "--config",
            std::env::temp_dir()
                .join("ticketroute-no-such-settings.json")
                .to_str()
                .unwrap(),
            "close",
            "123456789012345",
        ])
        .unwrap();
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("failed to read settings"));
        assert_eq!(status_code(&err), 500);

        let body = error_body(&err);
        let detail = body["error"].as_str().unwrap();
        let cause = err.root_cause().to_string();
        assert!(detail.starts_with("failed to read settings"));
        assert!(detail.ends_with(&format!(": {cause}")));
        assert_eq!(body["status"], 500);
    }
}
