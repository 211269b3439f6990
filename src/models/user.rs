use serde::{Deserialize, Serialize};

/// Backend-owned account, mirrored read-only on the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// Nickname when set, otherwise a placeholder
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(nick) if !nick.is_empty() => nick,
            _ => "No Nickname",
        }
    }
}

/// Body of `POST /admin/users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub is_admin: bool,
}

/// Body of `PUT /admin/users/{id}`. Password rotation is not part of this
/// payload, so there is no field for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.nickname.is_none() && self.is_admin.is_none()
    }
}
