use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::Credential;

/// What survives between CLI invocations; the terminal analogue of browser
/// storage and cookies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub api_url: String,
    pub credential: Option<Credential>,
    pub user_email: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(api_url: String, credential: Option<Credential>, user_email: Option<String>) -> Self {
        Self {
            api_url,
            credential,
            user_email,
            saved_at: Utc::now(),
        }
    }

    /// Credential only applies to the backend it was issued by
    pub fn credential_for(&self, api_url: &str) -> Option<Credential> {
        if self.api_url == api_url {
            self.credential.clone()
        } else {
            None
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PULSE_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("productpulse").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn session_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("session.json"))
}

pub fn load_session() -> anyhow::Result<Option<StoredSession>> {
    let session_file = session_file()?;

    if !session_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(session_file)?;
    match serde_json::from_str::<StoredSession>(&content) {
        Ok(stored) => Ok(Some(stored)),
        Err(e) => {
            // A corrupt file is the same as no session; the next login rewrites it
            tracing::warn!(error = %e, "ignoring unreadable session file");
            Ok(None)
        }
    }
}

pub fn save_session(stored: &StoredSession) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(stored)?;
    fs::write(session_file()?, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let session_file = session_file()?;
    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}
