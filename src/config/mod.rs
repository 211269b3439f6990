use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend origin, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Versioned API prefix joined in front of every relative path
    pub prefix: String,
    /// `None` leaves requests without a deadline
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub refresh_delay_ms: u64,
    pub refresh_attempts: u32,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Development defaults pointed at an arbitrary origin. Used by tests and
    /// by callers that already know where the backend lives.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PULSE_API_URL") {
            self.api.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("PULSE_API_PREFIX") {
            self.api.prefix = v;
        }
        if let Ok(v) = env::var("PULSE_REQUEST_TIMEOUT_SECS") {
            // "0" or "none" switches the deadline off
            self.api.request_timeout_secs = match v.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(secs),
                Err(_) if v.eq_ignore_ascii_case("none") => None,
                Err(_) => self.api.request_timeout_secs,
            };
        }
        if let Ok(v) = env::var("PULSE_REFRESH_DELAY_MS") {
            self.upload.refresh_delay_ms = v.parse().unwrap_or(self.upload.refresh_delay_ms);
        }
        if let Ok(v) = env::var("PULSE_REFRESH_ATTEMPTS") {
            self.upload.refresh_attempts = v.parse().unwrap_or(self.upload.refresh_attempts);
        }

        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.upload.refresh_delay_ms)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                prefix: "/api/v1".to_string(),
                request_timeout_secs: None,
            },
            upload: UploadConfig {
                refresh_delay_ms: 1000,
                refresh_attempts: 5,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging-api.productpulse.app".to_string(),
                prefix: "/api/v1".to_string(),
                request_timeout_secs: Some(60),
            },
            upload: UploadConfig {
                refresh_delay_ms: 1000,
                refresh_attempts: 5,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://api.productpulse.app".to_string(),
                prefix: "/api/v1".to_string(),
                request_timeout_secs: Some(30),
            },
            upload: UploadConfig {
                refresh_delay_ms: 1000,
                refresh_attempts: 3,
            },
        }
    }
}

// Process-wide config for the CLI; library types take a ClientConfig value instead
pub static CONFIG: Lazy<ClientConfig> = Lazy::new(ClientConfig::from_env);

pub fn config() -> &'static ClientConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
