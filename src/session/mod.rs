//! Session state holder.
//!
//! `Session` is constructed explicitly and handed to whatever needs it (the
//! CLI, view models, tests). It owns the identity state machine:
//!
//! ```text
//! Uninitialized -> Loading -> Authenticated(user) | Anonymous
//! ```
//!
//! State changes are published on a `watch` channel so a renderer can block
//! protected content while `Loading` without blocking anything else.

use serde::Deserialize;
use tokio::sync::watch;

use crate::api::{ApiClient, Credential};
use crate::error::{ClientError, ClientResult};
use crate::models::User;

pub const TOKEN_PATH: &str = "/auth/token";
pub const IDENTITY_PATH: &str = "/auth/users/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        self.user().map(|u| u.is_admin).unwrap_or(false)
    }

    /// Identity not yet known
    pub fn is_resolving(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Loading)
    }
}

// Token endpoint either issues a bearer token or sets a cookie and says so
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

pub struct Session {
    client: ApiClient,
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self { client, state }
    }

    /// Session seeded with a fixed state and no probe; for guards and renderers in tests
    pub fn with_state(client: ApiClient, initial: SessionState) -> Self {
        let (state, _) = watch::channel(initial);
        Self { client, state }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Credential to persist between runs, if any
    pub fn credential(&self) -> Option<Credential> {
        self.client.credential()
    }

    /// Identity probe. Any failure, 401 or transport, simply means anonymous.
    pub async fn initialize(&self) -> SessionState {
        self.state.send_replace(SessionState::Loading);
        let next = match self.probe().await {
            Ok(user) => {
                tracing::info!(user = %user.email, "session restored");
                SessionState::Authenticated(user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "identity probe failed; continuing anonymously");
                SessionState::Anonymous
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Resume from a stored credential, then probe
    pub async fn resume(&self, credential: Option<Credential>) -> SessionState {
        if let Some(credential) = credential {
            self.client.restore_credential(credential);
        }
        self.initialize().await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        self.state.send_replace(SessionState::Loading);

        match self.exchange_credentials(email, password).await {
            Ok(user) => {
                tracing::info!(user = %user.email, admin = user.is_admin, "logged in");
                self.state.send_replace(SessionState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.client.clear_credential();
                self.state.send_replace(SessionState::Anonymous);
                Err(ClientError::auth(e.user_message_or(LOGIN_FAILED)))
            }
        }
    }

    /// Always ends anonymous, whatever the backend says
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_query::<serde_json::Value>(LOGOUT_PATH, &[]).await {
            tracing::warn!(error = %e, "logout call failed; discarding local session anyway");
        }
        self.client.clear_credential();
        self.state.send_replace(SessionState::Anonymous);
    }

    async fn exchange_credentials(&self, email: &str, password: &str) -> ClientResult<User> {
        self.client.clear_credential();
        let token: TokenResponse = self
            .client
            .post_form(TOKEN_PATH, &[("username", email), ("password", password)])
            .await?;

        if let Some(access_token) = token.access_token {
            self.client.set_bearer_token(access_token);
        }

        // Cookie-based backends only confirm the login; identity comes from the probe
        self.probe().await
    }

    async fn probe(&self) -> ClientResult<User> {
        self.client.get::<User>(IDENTITY_PATH).await
    }
}
