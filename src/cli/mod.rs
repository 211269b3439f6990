pub mod commands;
pub mod config;
pub mod render;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::routing::{self, Route};
use crate::session::{Session, SessionState};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "ProductPulse CLI - upload review CSVs and browse their analysis")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Upload CSV files and inspect analysis results")]
    Uploads {
        #[command(subcommand)]
        cmd: commands::uploads::UploadCommands,
    },

    #[command(about = "Admin dashboard and user management")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Open a route path (/, /upload/:id, /admin, /admin/users) through the route guards")]
    Open {
        #[arg(help = "Route path", default_value = "/")]
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Uploads { cmd } => commands::uploads::handle(cmd, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, output_format).await,
        Commands::Open { path } => commands::open::handle(path, output_format).await,
    }
}

/// Builds the API client and resumes any stored session
pub async fn connect() -> anyhow::Result<Session> {
    let settings = crate::config::config();
    let client = ApiClient::new(settings)?;
    let stored = config::load_session()?;
    let credential = stored.and_then(|s| s.credential_for(client.base_url()));

    let session = Session::new(client);
    session.resume(credential).await;
    Ok(session)
}

/// Writes the session's current credential to disk, or clears it when anonymous
pub fn persist(session: &Session) -> anyhow::Result<()> {
    match session.state() {
        SessionState::Authenticated(user) => config::save_session(&config::StoredSession::new(
            session.client().base_url().to_string(),
            session.credential(),
            Some(user.email),
        )),
        _ => config::clear_session(),
    }
}

/// Connects and requires the guard for `route` to allow it
pub async fn connect_for(route: Route) -> anyhow::Result<Session> {
    let session = connect().await?;
    match routing::resolve(&session.state(), route) {
        Some(allowed) if allowed == route => Ok(session),
        Some(Route::Login) => anyhow::bail!("Not logged in. Run `pulse auth login <email>` first."),
        Some(other) => anyhow::bail!("Access denied: {} requires admin rights (redirected to {})", route, other),
        None => anyhow::bail!("Session is still resolving"),
    }
}
