use super::{Fetch, LoadState, Resource, Tone};
use crate::api::ApiClient;
use crate::models::{AnalysisResult, Sentiment, Upload, UploadStatus};

pub const FETCH_FAILED: &str = "Failed to fetch upload details.";
pub const PROCESSING_MESSAGE: &str = "Analysis is still in progress. Please check back in a moment.";
pub const NO_RESULTS_MESSAGE: &str = "No analysis results are available for this upload.";

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub topic: String,
    pub review_count: String,
    pub score: String,
    pub sentiment: Sentiment,
    pub tone: Tone,
    pub summary: String,
}

impl ResultCard {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let sentiment = result.sentiment();
        Self {
            topic: result.topic.clone(),
            review_count: match result.review_count {
                Some(1) => "1 review".to_string(),
                Some(n) => format!("{} reviews", n),
                None => "unknown number of reviews".to_string(),
            },
            score: result
                .sentiment_score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "n/a".to_string()),
            sentiment,
            tone: sentiment_tone(sentiment),
            summary: result.summary.clone().unwrap_or_default(),
        }
    }
}

pub fn sentiment_tone(sentiment: Sentiment) -> Tone {
    match sentiment {
        Sentiment::Positive => Tone::Success,
        Sentiment::Negative => Tone::Danger,
        Sentiment::Neutral => Tone::Muted,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailDisplay {
    Loading,
    /// Terminal; the view does not retry
    Error { message: String },
    Processing { filename: String, status: UploadStatus, message: &'static str },
    NoResults { filename: String, status: UploadStatus, message: &'static str },
    Results { filename: String, status: UploadStatus, cards: Vec<ResultCard> },
}

/// One upload and its per-topic results
pub struct UploadDetailView {
    client: ApiClient,
    upload: Resource<Upload>,
}

impl UploadDetailView {
    pub fn new(client: ApiClient) -> Self {
        Self { client, upload: Resource::new() }
    }

    /// Loading another id supersedes any fetch still in flight
    pub async fn load(&self, upload_id: i64) -> Fetch {
        let client = self.client.clone();
        let path = format!("/uploads/{}", upload_id);
        self.upload
            .load(async move { client.get::<Upload>(&path).await }, FETCH_FAILED)
            .await
    }

    pub fn state(&self) -> LoadState<Upload> {
        self.upload.snapshot()
    }

    pub fn unmount(&self) {
        self.upload.unmount();
    }

    pub fn render(&self) -> DetailDisplay {
        render_detail(&self.upload.snapshot())
    }
}

pub fn render_detail(state: &LoadState<Upload>) -> DetailDisplay {
    match state {
        LoadState::Idle | LoadState::Loading { .. } => DetailDisplay::Loading,
        LoadState::Failed { message, .. } => DetailDisplay::Error { message: message.clone() },
        LoadState::Loaded(upload) => render_upload(upload),
    }
}

pub fn render_upload(upload: &Upload) -> DetailDisplay {
    let filename = upload.filename.clone();
    let status = upload.status;

    if !upload.results.is_empty() {
        return DetailDisplay::Results {
            filename,
            status,
            cards: upload.results.iter().map(ResultCard::from_result).collect(),
        };
    }

    if upload.is_processing() {
        DetailDisplay::Processing { filename, status, message: PROCESSING_MESSAGE }
    } else {
        DetailDisplay::NoResults { filename, status, message: NO_RESULTS_MESSAGE }
    }
}
