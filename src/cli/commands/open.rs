use serde_json::json;

use crate::cli::commands::{admin, uploads};
use crate::cli::utils::output_json;
use crate::cli::{self, OutputFormat};
use crate::routing::{self, Route};
use crate::views::{AdminDashboardView, UploadDetailView, UploadsListView, UserManagementView};

/// Resolves `path` through the route guards and renders wherever they land
pub async fn handle(path: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let requested: Route = path.parse()?;
    let session = cli::connect().await?;

    let Some(route) = routing::resolve(&session.state(), requested) else {
        anyhow::bail!("Session is still resolving");
    };
    if route != requested {
        tracing::info!(from = %requested, to = %route, "redirected by route guard");
        if let OutputFormat::Text = output_format {
            println!("Redirected from {} to {}", requested, route);
        }
    }

    let client = session.client().clone();
    match route {
        Route::Login => match output_format {
            OutputFormat::Json => output_json(&json!({ "route": route.path(), "authenticated": false })),
            OutputFormat::Text => {
                println!("Not logged in. Run `pulse auth login <email>` to sign in.");
                Ok(())
            }
        },
        Route::UploadsList => {
            let view = UploadsListView::new(client);
            view.fetch().await;
            uploads::show_list(&view, &output_format)
        }
        Route::UploadDetail(id) => {
            let view = UploadDetailView::new(client);
            view.load(id).await;
            uploads::show_detail(&view, &output_format)
        }
        Route::AdminDashboard => {
            let view = AdminDashboardView::new(client);
            view.fetch().await;
            admin::show_dashboard(&view, &output_format)
        }
        Route::AdminUsers => {
            let view = UserManagementView::new(client);
            view.refresh().await;
            admin::show_users(&view, &output_format)
        }
    }
}
