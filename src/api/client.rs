use reqwest::{multipart::Form, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use super::credentials::{Credential, CredentialStore};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Thin wrapper over reqwest that knows the backend address and attaches the
/// session credential to every request. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    // Never carries credentials or cookies
    storage: reqwest::Client,
    store: Arc<CredentialStore>,
    base_url: String,
    prefix: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url)
            .map_err(|e| ClientError::network(format!("invalid base url '{}': {}", base_url, e)))?;
        let store = Arc::new(CredentialStore::new(origin));

        let mut builder = reqwest::Client::builder().cookie_provider(store.clone());
        let mut storage_builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
            storage_builder = storage_builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            storage: storage_builder.build()?,
            store,
            base_url,
            prefix: normalize_prefix(&config.api.prefix),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> Option<Credential> {
        self.store.credential()
    }

    pub fn set_bearer_token(&self, token: impl Into<String>) {
        self.store.set_bearer(token);
    }

    pub fn restore_credential(&self, credential: Credential) {
        self.store.restore(credential);
    }

    pub fn clear_credential(&self) {
        self.store.clear();
    }

    /// Absolute URL for a path relative to the API prefix
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let raw = format!("{}{}{}", self.base_url, self.prefix, path);
        Url::parse(&raw).map_err(|e| ClientError::network(format!("invalid url '{}': {}", raw, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.request(Method::GET, path, &[])?;
        self.execute(request).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path, &[])?.json(body);
        self.execute(request).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path, &[])?.json(body);
        self.execute(request).await
    }

    /// POST without a body; arguments travel in the query string
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let request = self.request(Method::POST, path, query)?;
        self.execute(request).await
    }

    /// POST as `application/x-www-form-urlencoded`
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> ClientResult<T> {
        let request = self.request(Method::POST, path, &[])?.form(form);
        self.execute(request).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, path, &[])?;
        self.execute::<Value>(request).await.map(|_| ())
    }

    /// Multipart POST to an absolute storage URL, bypassing the backend.
    /// Returns the storage response status.
    pub async fn submit_to_storage(&self, url: &str, form: Form) -> ClientResult<u16> {
        tracing::debug!(url, "submitting multipart form to storage target");
        let response = self.storage.post(url).multipart(form).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "storage target rejected upload");
            Err(ClientError::request(status.as_u16(), None))
        }
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> ClientResult<RequestBuilder> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        tracing::debug!(%method, %url, "api request");

        let mut builder = self.http.request(method, url);
        if let Some(token) = self.store.bearer() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "api request failed before a response arrived");
            ClientError::from(e)
        })?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let url = response.url().clone();
    let bytes = response.bytes().await?;
    tracing::debug!(status = status.as_u16(), %url, len = bytes.len(), "api response");

    if !status.is_success() {
        let detail = extract_detail(&bytes);
        return Err(ClientError::request(status.as_u16(), detail));
    }

    // 204 and empty bodies decode as JSON null, which fits () and Option<_>
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pulls the backend's `detail` message out of an error body. Validation
/// errors arrive as a list of objects; the first `msg` is used.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
