mod background;
mod bus;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod page;
mod services;
mod store;
mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::report::{self, CaptureCommandArgs};
use crate::config::Settings;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::host::LocalHost;
use crate::infra::jira::JiraClient;
use crate::services::PassthroughAnnotator;
use crate::store::SessionStore;

#[derive(Parser)]
#[command(
    name = "bugsnap",
    author,
    version,
    about = "Capture page context and file it as a tracker ticket"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a recorded page session and compose a ticket from it.
    Capture(CaptureArgs),
    /// Manage stored tracker settings.
    Config(ConfigArgs),
}

#[derive(Args)]
struct CaptureArgs {
    /// Path to the recorded page session (JSON).
    session: PathBuf,
    /// One-line summary for the ticket.
    #[arg(short, long)]
    summary: Option<String>,
    /// Answer a schema field without prompting, as KEY=id or KEY=id,id.
    #[arg(long = "field")]
    fields: Vec<String>,
    /// Never prompt; requires --summary.
    #[arg(long)]
    no_input: bool,
    /// Also write the captured screenshot to this path.
    #[arg(long)]
    keep_screenshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
        Commands::Capture(args) => run_capture(args).await,
    }
}

async fn run_capture(args: CaptureArgs) -> AppResult<()> {
    let settings = Settings::load()?;

    if settings.tracker_host.is_none() {
        eprintln!("Warning: tracker host not configured; schema fetch and ticket creation will fail.");
    }
    if settings.identity.is_none() || settings.secret.is_none() {
        eprintln!("Warning: tracker credentials not configured; ticket creation will fail.");
    }
    if settings.project_key.is_none() {
        eprintln!("Warning: project key not configured; ticket creation will fail.");
    }

    let context = AppContext::new(
        Arc::new(SessionStore::new(settings)),
        Arc::new(LocalHost::new()),
        Arc::new(JiraClient::new()),
        Arc::new(PassthroughAnnotator),
    );

    report::run(
        &context,
        CaptureCommandArgs {
            session: args.session,
            summary: args.summary,
            fields: args.fields,
            no_input: args.no_input,
            keep_screenshot: args.keep_screenshot,
        },
    )
    .await
}
