use chrono::{DateTime, Local, Utc};

use super::{Fetch, LoadState, Resource, Tone};
use crate::api::ApiClient;
use crate::models::{Upload, UploadStatus};
use crate::routing::Route;

pub const UPLOADS_PATH: &str = "/uploads/";
pub const EMPTY_MESSAGE: &str = "No uploads found. Upload a file to get started.";
pub const FETCH_FAILED: &str = "Failed to fetch uploads.";

/// Rows drawn for the initial load
pub const SKELETON_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRow {
    pub id: i64,
    pub filename: String,
    pub status: UploadStatus,
    pub tone: Tone,
    pub uploaded_on: String,
    pub link: Route,
}

impl UploadRow {
    fn from_upload(upload: &Upload) -> Self {
        Self {
            id: upload.id,
            filename: upload.filename.clone(),
            status: upload.status,
            tone: status_tone(upload.status),
            uploaded_on: format_timestamp(&upload.created_at),
            link: Route::UploadDetail(upload.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadsListDisplay {
    /// First load in flight, nothing to show yet
    Skeleton { rows: usize },
    Empty { message: &'static str },
    Rows { rows: Vec<UploadRow>, refreshing: bool },
    Error { message: String },
}

pub fn status_tone(status: UploadStatus) -> Tone {
    match status {
        UploadStatus::Completed => Tone::Success,
        UploadStatus::Failed => Tone::Danger,
        _ => Tone::Warning,
    }
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// All uploads for the current session. Refreshed on demand only.
pub struct UploadsListView {
    client: ApiClient,
    uploads: Resource<Vec<Upload>>,
}

impl UploadsListView {
    pub fn new(client: ApiClient) -> Self {
        Self { client, uploads: Resource::new() }
    }

    pub async fn fetch(&self) -> Fetch {
        let client = self.client.clone();
        self.uploads
            .load(async move { client.get::<Vec<Upload>>(UPLOADS_PATH).await }, FETCH_FAILED)
            .await
    }

    pub fn state(&self) -> LoadState<Vec<Upload>> {
        self.uploads.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<LoadState<Vec<Upload>>> {
        self.uploads.subscribe()
    }

    pub fn unmount(&self) {
        self.uploads.unmount();
    }

    pub fn contains_filename(&self, filename: &str) -> bool {
        self.uploads
            .snapshot()
            .data()
            .map(|uploads| uploads.iter().any(|u| u.filename == filename))
            .unwrap_or(false)
    }

    pub fn render(&self) -> UploadsListDisplay {
        render_list(&self.uploads.snapshot())
    }
}

pub fn render_list(state: &LoadState<Vec<Upload>>) -> UploadsListDisplay {
    match state {
        LoadState::Idle | LoadState::Loading { previous: None } => {
            UploadsListDisplay::Skeleton { rows: SKELETON_ROWS }
        }
        LoadState::Failed { message, previous: None } => UploadsListDisplay::Error {
            message: message.clone(),
        },
        _ => {
            let uploads = state.data().map(Vec::as_slice).unwrap_or_default();
            if uploads.is_empty() && !state.is_loading() {
                UploadsListDisplay::Empty { message: EMPTY_MESSAGE }
            } else {
                UploadsListDisplay::Rows {
                    rows: uploads.iter().map(UploadRow::from_upload).collect(),
                    refreshing: state.is_loading(),
                }
            }
        }
    }
}
