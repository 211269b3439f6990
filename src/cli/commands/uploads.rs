use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::render;
use crate::cli::utils::*;
use crate::cli::{self, OutputFormat};
use crate::routing::Route;
use crate::upload::{self, UploadOrchestrator, Visibility};
use crate::views::{LoadState, UploadDetailView, UploadsListView};

#[derive(Subcommand)]
pub enum UploadCommands {
    #[command(about = "List all uploads with their processing status")]
    List,

    #[command(about = "Show one upload and its analysis results by topic")]
    Show {
        #[arg(help = "Upload ID")]
        id: i64,
    },

    #[command(about = "Validate and upload a CSV file of reviews")]
    Send {
        #[arg(help = "Path to a .csv file with a 'Review Text' column")]
        file: PathBuf,
        #[arg(long, help = "Do not wait for the upload to appear in the list")]
        no_wait: bool,
    },
}

pub async fn handle(cmd: UploadCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UploadCommands::List => {
            let session = cli::connect_for(Route::UploadsList).await?;
            let view = UploadsListView::new(session.client().clone());
            view.fetch().await;
            show_list(&view, &output_format)
        }
        UploadCommands::Show { id } => {
            let session = cli::connect_for(Route::UploadDetail(id)).await?;
            let view = UploadDetailView::new(session.client().clone());
            view.load(id).await;
            show_detail(&view, &output_format)
        }
        UploadCommands::Send { file, no_wait } => {
            let session = cli::connect_for(Route::UploadsList).await?;
            let client = session.client().clone();
            let orchestrator = UploadOrchestrator::new(client.clone(), crate::config::config().upload.clone());

            if let OutputFormat::Text = output_format {
                println!("Uploading {}...", file.display());
            }

            let receipt = match orchestrator.upload_file(&file).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    return Err(command_error(&output_format, &upload::failure_message(&e), Some(e.error_code())));
                }
            };

            if no_wait {
                return output_success(
                    &output_format,
                    upload::UPLOAD_STARTED,
                    Some(json!({ "filename": receipt.filename })),
                );
            }

            let list = UploadsListView::new(client);
            let visibility = orchestrator.refresh_until_visible(&list, &receipt.filename).await;
            output_success(
                &output_format,
                upload::UPLOAD_STARTED,
                Some(json!({
                    "filename": receipt.filename,
                    "listed": visibility == Visibility::Visible,
                })),
            )?;

            if let OutputFormat::Text = output_format {
                if visibility == Visibility::Pending {
                    println!("The upload is not listed yet; run `pulse uploads list` in a moment.");
                }
                render::print_uploads(&list.render());
            }
            Ok(())
        }
    }
}

pub fn show_list(view: &UploadsListView, output_format: &OutputFormat) -> anyhow::Result<()> {
    let state = view.state();
    match output_format {
        OutputFormat::Json => match &state {
            LoadState::Loaded(uploads) if uploads.is_empty() => {
                output_empty_collection(output_format, "uploads", crate::views::uploads::EMPTY_MESSAGE)
            }
            LoadState::Loaded(uploads) => output_json(&json!({ "uploads": uploads })),
            _ => Err(command_error(output_format, state.error().unwrap_or("Failed to fetch uploads."), None)),
        },
        OutputFormat::Text => match state.error() {
            // The binary reports the error itself
            Some(message) => anyhow::bail!("{}", message),
            None => {
                render::print_uploads(&view.render());
                Ok(())
            }
        },
    }
}

pub fn show_detail(view: &UploadDetailView, output_format: &OutputFormat) -> anyhow::Result<()> {
    let state = view.state();
    match output_format {
        OutputFormat::Json => match &state {
            LoadState::Loaded(upload) => output_json(upload),
            _ => Err(command_error(output_format, state.error().unwrap_or("Failed to fetch upload details."), None)),
        },
        OutputFormat::Text => match state.error() {
            // The binary reports the error itself
            Some(message) => anyhow::bail!("{}", message),
            None => {
                render::print_detail(&view.render());
                Ok(())
            }
        },
    }
}
