use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{self, OutputFormat};
use crate::session::SessionState;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the ProductPulse backend")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and discard the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = value_or_prompt(password, "Password: ").await?;
            let session = cli::connect().await?;

            match session.login(&email, &password).await {
                Ok(user) => {
                    cli::persist(&session)?;
                    output_success(
                        &output_format,
                        &format!("Logged in as {}", user.email),
                        Some(json!({ "user": user })),
                    )
                }
                Err(e) => {
                    // The failed exchange dropped the old credential; the file follows
                    cli::persist(&session)?;
                    Err(command_error(&output_format, &e.user_message(), Some(e.error_code())))
                }
            }
        }
        AuthCommands::Logout => {
            let session = cli::connect().await?;
            session.logout().await;
            cli::persist(&session)?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let session = cli::connect().await?;
            let state = session.state();
            match output_format {
                OutputFormat::Json => output_json(&json!({
                    "authenticated": state.is_authenticated(),
                    "is_admin": state.is_admin(),
                    "user": state.user(),
                    "api_url": session.client().base_url(),
                })),
                OutputFormat::Text => {
                    match &state {
                        SessionState::Authenticated(user) => println!(
                            "Logged in to {} as {}{}",
                            session.client().base_url(),
                            user.email,
                            if user.is_admin { " (admin)" } else { "" }
                        ),
                        _ => println!("Not logged in to {}", session.client().base_url()),
                    }
                    Ok(())
                }
            }
        }
        AuthCommands::Whoami => {
            let session = cli::connect().await?;
            let Some(user) = session.current_user() else {
                return Err(command_error(&output_format, "Not logged in", Some("UNAUTHORIZED")));
            };
            match output_format {
                OutputFormat::Json => output_json(&user),
                OutputFormat::Text => {
                    println!("ID:       {}", user.id);
                    println!("Email:    {}", user.email);
                    println!("Nickname: {}", user.display_name());
                    println!("Admin:    {}", if user.is_admin { "yes" } else { "no" });
                    Ok(())
                }
            }
        }
    }
}
