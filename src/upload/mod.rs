//! Two-phase CSV upload.
//!
//! 1. Ask the backend for a pre-signed target (`url` + opaque form fields).
//! 2. Post a multipart form straight to that target: every backend field in
//!    the order received, then the file part last.
//!
//! After a successful transfer the backend needs a moment to register the new
//! record, so the uploads list is refetched a bounded number of times until
//! the file shows up. Not showing up yet is an expected outcome.

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::path::Path;

use crate::api::ApiClient;
use crate::config::UploadConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::PresignedUpload;
use crate::validation::{self, ValidationError};
use crate::views::{Fetch, UploadsListView};

pub const PRESIGNED_PATH: &str = "/uploads/presigned-url";
pub const FILE_FIELD: &str = "file";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";
pub const UPLOAD_STARTED: &str = "Upload successful! Processing has started.";

/// One entry of the storage submission, in send order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPart {
    Field { name: String, value: String },
    File { name: String, filename: String, content_type: String },
}

impl SubmissionPart {
    pub fn name(&self) -> &str {
        match self {
            SubmissionPart::Field { name, .. } | SubmissionPart::File { name, .. } => name,
        }
    }
}

/// Layout of the storage form: backend fields first, file last
pub fn build_submission(presigned: &PresignedUpload, filename: &str) -> Vec<SubmissionPart> {
    let mut parts: Vec<SubmissionPart> = presigned
        .form_fields()
        .into_iter()
        .map(|(name, value)| SubmissionPart::Field { name, value })
        .collect();
    parts.push(SubmissionPart::File {
        name: FILE_FIELD.to_string(),
        filename: filename.to_string(),
        content_type: CSV_CONTENT_TYPE.to_string(),
    });
    parts
}

/// File contents for the storage form
pub enum Payload {
    Bytes(Vec<u8>),
    /// Streamed from disk; `len` goes into the part's Content-Length
    File { file: tokio::fs::File, len: u64 },
}

fn into_form(parts: Vec<SubmissionPart>, payload: Payload) -> ClientResult<Form> {
    let mut form = Form::new();
    let mut payload = Some(payload);
    for part in parts {
        form = match part {
            SubmissionPart::Field { name, value } => form.text(name, value),
            SubmissionPart::File { name, filename, content_type } => {
                let body = match payload.take() {
                    Some(Payload::Bytes(bytes)) => Part::bytes(bytes),
                    Some(Payload::File { file, len }) => Part::stream_with_length(Body::from(file), len),
                    None => Part::bytes(Vec::new()),
                };
                let file = body
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| ClientError::network(format!("invalid content type: {}", e)))?;
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: String,
    pub target_url: String,
    pub storage_status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Not listed yet; the backend may still be ingesting it
    Pending,
}

/// Message for a failed upload: backend detail from phase 1 when available,
/// otherwise the generic text
pub fn failure_message(err: &ClientError) -> String {
    err.user_message_or(UPLOAD_FAILED)
}

pub struct UploadOrchestrator {
    client: ApiClient,
    settings: UploadConfig,
}

impl UploadOrchestrator {
    pub fn new(client: ApiClient, settings: UploadConfig) -> Self {
        Self { client, settings }
    }

    /// Validates the file on disk, then streams it to storage
    pub async fn upload_file(&self, path: &Path) -> ClientResult<UploadReceipt> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ValidationError::InvalidFilename {
                filename: path.display().to_string(),
            })?
            .to_string();

        validation::validate_filename(&filename)?;
        validation::validate_csv_file(path).await?;

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ValidationError::Unparseable { reason: e.to_string() })?;
        let len = file
            .metadata()
            .await
            .map_err(|e| ValidationError::Unparseable { reason: e.to_string() })?
            .len();
        self.transfer(&filename, Payload::File { file, len }).await
    }

    /// Validates in-memory contents, then uploads them under `filename`
    pub async fn upload_bytes(&self, filename: &str, contents: Vec<u8>) -> ClientResult<UploadReceipt> {
        validation::validate_filename(filename)?;
        validation::validate_csv_header(contents.as_slice()).await?;
        self.transfer(filename, Payload::Bytes(contents)).await
    }

    /// Upload, then refetch `list` until the file is visible or attempts run out
    pub async fn upload_and_refresh(
        &self,
        path: &Path,
        list: &UploadsListView,
    ) -> ClientResult<(UploadReceipt, Visibility)> {
        let receipt = self.upload_file(path).await?;
        let visibility = self.refresh_until_visible(list, &receipt.filename).await;
        Ok((receipt, visibility))
    }

    pub async fn refresh_until_visible(&self, list: &UploadsListView, filename: &str) -> Visibility {
        let attempts = self.settings.refresh_attempts.max(1);
        let delay = std::time::Duration::from_millis(self.settings.refresh_delay_ms);

        for attempt in 1..=attempts {
            tokio::time::sleep(delay).await;
            if list.fetch().await == Fetch::Stale {
                tracing::debug!(filename, "uploads list went away; stopping refresh");
                return Visibility::Pending;
            }
            if list.contains_filename(filename) {
                tracing::debug!(filename, attempt, "new upload visible");
                return Visibility::Visible;
            }
        }

        tracing::info!(filename, attempts, "new upload not listed yet");
        Visibility::Pending
    }

    async fn transfer(&self, filename: &str, payload: Payload) -> ClientResult<UploadReceipt> {
        let presigned: PresignedUpload = self
            .client
            .post_query(PRESIGNED_PATH, &[("filename", filename)])
            .await
            .map_err(|e| {
                tracing::warn!(filename, error = %e, "pre-signed upload request rejected");
                e
            })?;
        tracing::debug!(filename, url = %presigned.url, fields = presigned.fields.len(), "received upload target");

        let form = into_form(build_submission(&presigned, filename), payload)?;
        let storage_status = self
            .client
            .submit_to_storage(&presigned.url, form)
            .await
            .map_err(|e| match e {
                // Storage errors never carry a user-facing detail
                ClientError::Request { status, .. } => ClientError::request(status, None),
                other => other,
            })?;

        tracing::info!(filename, storage_status, "upload transferred");
        Ok(UploadReceipt {
            filename: filename.to_string(),
            target_url: presigned.url,
            storage_status,
        })
    }
}
