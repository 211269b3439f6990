use chrono::Utc;
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use url::Url;

/// What the client presents to the backend on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Credential {
    /// Sent as `Authorization: Bearer <token>`
    Bearer(String),
    /// Backend-set session cookies, as a `Cookie` header value
    Cookie(String),
}

/// Holds the bearer token and the backend's session cookies.
///
/// Doubles as the reqwest cookie provider so cookies set by the backend are
/// captured, and can be dropped locally on logout even when the backend never
/// answers the logout call.
#[derive(Debug)]
pub struct CredentialStore {
    origin: Url,
    bearer: RwLock<Option<String>>,
    cookies: RwLock<BTreeMap<String, String>>,
}

impl CredentialStore {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            bearer: RwLock::new(None),
            cookies: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn bearer(&self) -> Option<String> {
        self.bearer.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_bearer(&self, token: impl Into<String>) {
        *self.bearer.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    /// Current credential; a bearer token wins over cookies
    pub fn credential(&self) -> Option<Credential> {
        if let Some(token) = self.bearer() {
            return Some(Credential::Bearer(token));
        }
        self.cookie_header().map(Credential::Cookie)
    }

    pub fn restore(&self, credential: Credential) {
        self.clear();
        match credential {
            Credential::Bearer(token) => self.set_bearer(token),
            Credential::Cookie(header) => {
                let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
                for pair in header.split(';') {
                    if let Some((name, value)) = parse_pair(pair) {
                        cookies.insert(name, value);
                    }
                }
            }
        }
    }

    pub fn clear(&self) {
        *self.bearer.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.cookies.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
    }

    fn apply_set_cookie(&self, raw: &str) {
        let parsed = match Cookie::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed Set-Cookie header");
                return;
            }
        };

        let name = parsed.name().to_string();
        let value = parsed.value().trim_matches('"').to_string();
        let expired = value.is_empty()
            || parsed.max_age().map(|age| age.whole_seconds() <= 0).unwrap_or(false)
            || parsed
                .expires_datetime()
                .map(|at| at.unix_timestamp() <= Utc::now().timestamp())
                .unwrap_or(false);

        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        if expired {
            tracing::debug!(cookie = %name, "session cookie removed by backend");
            cookies.remove(&name);
        } else {
            tracing::debug!(cookie = %name, "session cookie stored");
            cookies.insert(name, value);
        }
    }
}

impl CookieStore for CredentialStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if !self.same_origin(url) {
            return;
        }
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.apply_set_cookie(raw);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if !self.same_origin(url) {
            return None;
        }
        self.cookie_header()
            .and_then(|header| HeaderValue::from_str(&header).ok())
    }
}

fn parse_pair(pair: &str) -> Option<(String, String)> {
    let (name, value) = pair.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().trim_matches('"').to_string()))
}
