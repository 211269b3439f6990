use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counts from `GET /admin/analytics`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_users: u64,
    pub total_uploads: u64,
    pub total_analysis_results: u64,
    #[serde(default)]
    pub uploads_by_status: BTreeMap<String, u64>,
}

impl Analytics {
    pub fn uploads_with_status(&self, status: &str) -> u64 {
        self.uploads_by_status.get(status).copied().unwrap_or(0)
    }
}
