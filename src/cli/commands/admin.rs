use clap::Subcommand;
use serde_json::json;

use crate::cli::render;
use crate::cli::utils::*;
use crate::cli::{self, OutputFormat};
use crate::models::{NewUser, UserChanges};
use crate::routing::Route;
use crate::views::admin::{ANALYTICS_FETCH_FAILED, USERS_FETCH_FAILED};
use crate::views::{AdminDashboardView, AssumeYes, Confirm, LoadState, UserManagementView};

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Show platform-wide analytics")]
    Stats,

    #[command(about = "Manage user accounts")]
    Users {
        #[command(subcommand)]
        cmd: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List all users")]
    List,

    #[command(about = "Create a user")]
    Create {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (prompted when omitted)")]
        password: Option<String>,
        #[arg(long, help = "Display nickname")]
        nickname: Option<String>,
        #[arg(long, help = "Grant admin rights")]
        admin: bool,
    },

    #[command(about = "Update a user's email, nickname or admin flag")]
    Update {
        #[arg(help = "User ID")]
        id: i64,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long, value_name = "BOOL")]
        admin: Option<bool>,
    },

    #[command(about = "Delete a user")]
    Delete {
        #[arg(help = "User ID")]
        id: i64,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Stats => {
            let session = cli::connect_for(Route::AdminDashboard).await?;
            let view = AdminDashboardView::new(session.client().clone());
            view.fetch().await;
            show_dashboard(&view, &output_format)
        }
        AdminCommands::Users { cmd } => handle_users(cmd, output_format).await,
    }
}

async fn handle_users(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let session = cli::connect_for(Route::AdminUsers).await?;
    let view = UserManagementView::new(session.client().clone());

    match cmd {
        UserCommands::List => {
            view.refresh().await;
            show_users(&view, &output_format)
        }
        UserCommands::Create { email, password, nickname, admin } => {
            let password = value_or_prompt(password, "Password: ").await?;
            let notice = view
                .create(NewUser { email, password, nickname, is_admin: admin })
                .await;
            output_notice(&output_format, &notice)
        }
        UserCommands::Update { id, email, nickname, admin } => {
            let notice = view
                .update(id, UserChanges { email, nickname, is_admin: admin })
                .await;
            output_notice(&output_format, &notice)
        }
        UserCommands::Delete { id, yes } => {
            let confirm: Box<dyn Confirm> = if yes { Box::new(AssumeYes) } else { Box::new(StdinConfirm) };
            match view.delete(id, confirm.as_ref()).await {
                Some(notice) => output_notice(&output_format, &notice),
                None => output_success(&output_format, "Deletion cancelled", Some(json!({ "deleted": false }))),
            }
        }
    }
}

pub fn show_users(view: &UserManagementView, output_format: &OutputFormat) -> anyhow::Result<()> {
    match view.state() {
        LoadState::Loaded(users) => match output_format {
            OutputFormat::Json => output_json(&json!({ "users": users })),
            OutputFormat::Text => {
                render::print_users(&view.render());
                Ok(())
            }
        },
        state => Err(command_error(output_format, state.error().unwrap_or(USERS_FETCH_FAILED), None)),
    }
}

pub fn show_dashboard(view: &AdminDashboardView, output_format: &OutputFormat) -> anyhow::Result<()> {
    match view.state() {
        LoadState::Loaded(stats) => match output_format {
            OutputFormat::Json => output_json(&stats),
            OutputFormat::Text => {
                render::print_dashboard(&view.render());
                Ok(())
            }
        },
        state => Err(command_error(output_format, state.error().unwrap_or(ANALYTICS_FETCH_FAILED), None)),
    }
}
