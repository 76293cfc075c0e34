//! VAURMS CLI - command-line access to the VAURMS dashboard API.
//!
//! This binary is the composition root: it builds the one shared credential
//! store and request engine, guards commands that need a session, and turns
//! session-expiry signals into a "log in again" instruction.

mod commands;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vaurms_core::models::UserRole;
use vaurms_core::{ApiClient, Config, CredentialStore, SessionEvent};

#[derive(Parser)]
#[command(name = "vaurms", version, about = "Command-line client for the VAURMS dashboard API")]
struct Cli {
    /// API root to talk to (overrides config and VAURMS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and store the access token
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out (local session is always cleared)
    Logout,
    /// Show the signed-in user
    Whoami,
    /// GET an API path, printing the response
    Get {
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short = 'q', long = "query", value_parser = commands::parse_key_val)]
        query: Vec<(String, String)>,
    },
    /// POST a JSON body to an API path
    Post {
        path: String,
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
    /// PUT a JSON body to an API path
    Put {
        path: String,
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
    /// PATCH a JSON body to an API path
    Patch {
        path: String,
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
    /// DELETE an API path
    Delete { path: String },
    /// Work with uploaded datasets
    Datasets {
        #[command(subcommand)]
        command: DatasetCommand,
    },
    /// Download an API path to the download directory
    Download { path: String, name: String },
    /// Export a report and download it
    Report {
        /// Output format, e.g. pdf
        report_type: String,
        /// Report scope, e.g. kpi
        scope: String,
    },
    /// Dashboard KPIs, trends and cohorts
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },
    /// Model or optimise rate structures
    Rates {
        #[command(subcommand)]
        command: RatesCommand,
    },
    /// Run a multi-year financial forecast
    Forecast {
        /// Scenario parameters as JSON
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
    /// Audit log and background jobs (admin only)
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    /// Manage user accounts (admin only)
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand)]
pub enum AnalyticsCommand {
    /// Headline KPIs
    Kpis,
    /// Monthly trend of a metric
    Trends {
        /// revenue or consumption
        #[arg(long, default_value = "revenue")]
        metric: String,
    },
    /// Customer breakdown for a class
    Cohorts {
        /// residential or commercial
        #[arg(long = "class", default_value = "residential")]
        customer_class: String,
    },
}

#[derive(Subcommand)]
pub enum RatesCommand {
    /// Bill impacts of a candidate rate structure
    Model {
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
    /// Optimised tier structure
    Optimise {
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Recent audit entries
    Audit,
    /// Background job statuses
    Jobs,
}

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List all accounts
    List,
    /// Create an account (password is prompted)
    Create {
        email: String,
        #[arg(long, value_parser = commands::parse_role)]
        role: Option<UserRole>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DatasetCommand {
    /// List datasets, newest first
    List,
    /// Upload a CSV/XLSX file
    Upload {
        file: std::path::PathBuf,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a dataset's profile
    Profile { id: i64 },
    /// Make a dataset the active baseline
    Commit { id: i64 },
}

impl Command {
    /// Commands reachable without a stored credential.
    fn is_public(&self) -> bool {
        matches!(self, Command::Login { .. } | Command::Logout)
    }

    /// Whether a 401 during this command means "log in again". A rejected
    /// login is reported by the command itself.
    fn announces_expiry(&self) -> bool {
        !matches!(self, Command::Login { .. })
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Background task translating session-expiry signals into the CLI's
/// "go to login" action. Announces once, however many requests were rejected.
struct LoginRedirect {
    task: JoinHandle<Option<String>>,
}

impl LoginRedirect {
    fn spawn<F>(mut events: broadcast::Receiver<SessionEvent>, notify: F) -> Self
    where
        F: Fn(&str) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut expired: Option<String> = None;
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired { path }) => {
                        if expired.is_none() {
                            notify(&path);
                            expired = Some(path);
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            expired
        });
        Self { task }
    }

    /// Wait until every client is dropped and return the first expired path.
    async fn finish(self) -> Option<String> {
        self.task.await.ok().flatten()
    }
}

fn announce_expiry(path: &str) {
    eprintln!(
        "Session expired while requesting {}. Run `vaurms login` to sign in again.",
        path
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!(api = %config.api_base_url, "VAURMS CLI starting");

    let storage = config
        .credential_storage()
        .context("Failed to open credential storage")?;
    let credentials = Arc::new(CredentialStore::open(storage));
    let api = ApiClient::new(&config.client_config(), credentials)?;

    if !cli.command.is_public() && !api.credentials().is_present() {
        anyhow::bail!("Not logged in - run `vaurms login` first");
    }

    let redirect = cli
        .command
        .announces_expiry()
        .then(|| LoginRedirect::spawn(api.subscribe(), announce_expiry));

    let result = commands::dispatch(&api, &mut config, cli.command).await;

    // Closes the event channel so the redirect task drains and exits
    drop(api);
    if let Some(redirect) = redirect {
        redirect.finish().await;
    }
    result
}
