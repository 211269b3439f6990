use async_trait::async_trait;

use super::{Fetch, LoadState, Notice, Resource};
use crate::api::ApiClient;
use crate::models::{Analytics, NewUser, User, UserChanges};

pub const USERS_PATH: &str = "/admin/users";
pub const ANALYTICS_PATH: &str = "/admin/analytics";

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this user? This action cannot be undone.";
pub const USERS_FETCH_FAILED: &str = "Failed to fetch users.";
pub const ANALYTICS_FETCH_FAILED: &str = "Failed to load analytics.";

/// Asks the person at the keyboard before a destructive call
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Non-interactive confirmation, e.g. `--yes`
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UsersDisplay {
    Skeleton { rows: usize },
    Users(Vec<User>),
    Error { message: String },
}

/// Admin user list with create/update/delete. Every successful mutation is
/// followed by a full refetch; nothing is patched locally.
pub struct UserManagementView {
    client: ApiClient,
    users: Resource<Vec<User>>,
}

impl UserManagementView {
    pub fn new(client: ApiClient) -> Self {
        Self { client, users: Resource::new() }
    }

    pub async fn refresh(&self) -> Fetch {
        let client = self.client.clone();
        self.users
            .load(async move { client.get::<Vec<User>>(USERS_PATH).await }, USERS_FETCH_FAILED)
            .await
    }

    pub fn state(&self) -> LoadState<Vec<User>> {
        self.users.snapshot()
    }

    pub fn unmount(&self) {
        self.users.unmount();
    }

    pub fn render(&self) -> UsersDisplay {
        render_users(self.users.snapshot())
    }

    pub async fn create(&self, user: NewUser) -> Notice {
        if user.email.trim().is_empty() || user.password.is_empty() {
            return Notice::error("Email and password are required.");
        }

        tracing::info!(email = %user.email, admin = user.is_admin, "creating user");
        match self.client.post_json::<_, User>(USERS_PATH, &user).await {
            Ok(created) => {
                tracing::debug!(id = created.id, "user created");
                self.refresh().await;
                Notice::success("User created successfully!")
            }
            Err(e) => {
                tracing::warn!(error = %e, "create user failed");
                Notice::error(e.user_message_or("Failed to create user."))
            }
        }
    }

    pub async fn update(&self, user_id: i64, changes: UserChanges) -> Notice {
        if changes.is_empty() {
            return Notice::error("Nothing to update.");
        }

        let path = format!("{}/{}", USERS_PATH, user_id);
        tracing::info!(user_id, "updating user");
        match self.client.put_json::<_, User>(&path, &changes).await {
            Ok(_) => {
                self.refresh().await;
                Notice::success("User updated successfully!")
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id, "update user failed");
                Notice::error(e.user_message_or("Failed to update user."))
            }
        }
    }

    /// `None` when the confirmation was declined; no request is made then
    pub async fn delete(&self, user_id: i64, confirm: &dyn Confirm) -> Option<Notice> {
        if !confirm.confirm(DELETE_PROMPT).await {
            tracing::debug!(user_id, "user deletion cancelled");
            return None;
        }

        let path = format!("{}/{}", USERS_PATH, user_id);
        tracing::info!(user_id, "deleting user");
        let notice = match self.client.delete(&path).await {
            Ok(()) => {
                self.refresh().await;
                Notice::success("User deleted successfully!")
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id, "delete user failed");
                Notice::error(e.user_message_or("Failed to delete user."))
            }
        };
        Some(notice)
    }
}

/// Last loaded users stay on screen through a refresh or a failed refetch
pub fn render_users(state: LoadState<Vec<User>>) -> UsersDisplay {
    match state {
        LoadState::Idle | LoadState::Loading { previous: None } => UsersDisplay::Skeleton { rows: 3 },
        LoadState::Loaded(users)
        | LoadState::Loading { previous: Some(users) }
        | LoadState::Failed { previous: Some(users), .. } => UsersDisplay::Users(users),
        LoadState::Failed { message, previous: None } => UsersDisplay::Error { message },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardDisplay {
    Loading,
    Stats(Analytics),
    Error { message: String },
}

/// Platform-wide counts for admins
pub struct AdminDashboardView {
    client: ApiClient,
    analytics: Resource<Analytics>,
}

impl AdminDashboardView {
    pub fn new(client: ApiClient) -> Self {
        Self { client, analytics: Resource::new() }
    }

    pub async fn fetch(&self) -> Fetch {
        let client = self.client.clone();
        self.analytics
            .load(async move { client.get::<Analytics>(ANALYTICS_PATH).await }, ANALYTICS_FETCH_FAILED)
            .await
    }

    pub fn state(&self) -> LoadState<Analytics> {
        self.analytics.snapshot()
    }

    pub fn render(&self) -> DashboardDisplay {
        match self.analytics.snapshot() {
            LoadState::Loaded(stats) => DashboardDisplay::Stats(stats),
            LoadState::Failed { message, .. } => DashboardDisplay::Error { message },
            _ => DashboardDisplay::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![User {
            id: 1,
            email: "admin@example.com".into(),
            nickname: None,
            is_admin: true,
        }]
    }

    #[test]
    fn failed_refetch_keeps_previous_users() {
        let state = LoadState::Failed {
            message: USERS_FETCH_FAILED.to_string(),
            previous: Some(users()),
        };
        assert_eq!(render_users(state), UsersDisplay::Users(users()));
    }

    #[test]
    fn first_load_failure_and_skeleton() {
        assert_eq!(render_users(LoadState::Idle), UsersDisplay::Skeleton { rows: 3 });
        assert_eq!(
            render_users(LoadState::Loading { previous: Some(users()) }),
            UsersDisplay::Users(users())
        );
        assert_eq!(
            render_users(LoadState::Failed { message: USERS_FETCH_FAILED.to_string(), previous: None }),
            UsersDisplay::Error { message: USERS_FETCH_FAILED.to_string() }
        );
    }
}
