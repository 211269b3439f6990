use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Scores strictly above this are positive, strictly below its negation negative
pub const SENTIMENT_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
            UploadStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub id: i64,
    pub filename: String,
    pub status: UploadStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    // List responses may omit results entirely
    #[serde(default)]
    pub results: Vec<AnalysisResult>,
}

impl Upload {
    /// Still waiting on the analysis pipeline
    pub fn is_processing(&self) -> bool {
        matches!(self.status, UploadStatus::Processing | UploadStatus::Pending)
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    // Offset-less timestamps are taken as UTC
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Per-topic aggregate produced by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub topic: String,
    #[serde(default)]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl AnalysisResult {
    pub fn sentiment(&self) -> Sentiment {
        self.sentiment_score
            .map(Sentiment::classify)
            .unwrap_or(Sentiment::Neutral)
    }
}

/// Display classification of a sentiment score. Not stored anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn classify(score: f64) -> Self {
        if score > SENTIMENT_THRESHOLD {
            Sentiment::Positive
        } else if score < -SENTIMENT_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Direct-to-storage upload target issued by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PresignedUpload {
    pub url: String,
    // Order is preserved from the response body
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl PresignedUpload {
    /// Fields as text form values, in the order the backend sent them
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name.clone(), text)
            })
            .collect()
    }
}
