//! Client-side routes and the guards in front of them.
//!
//! Guards are pure: `(session state, capability) -> decision`. The caller
//! (CLI or any other front end) acts on the decision; guards never probe or
//! navigate by themselves.

use std::fmt;
use std::str::FromStr;

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    UploadsList,
    UploadDetail(i64),
    AdminDashboard,
    AdminUsers,
}

/// What a route needs from the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectTo(Route),
    /// Identity still resolving; render nothing protected yet
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no route matches '{0}'")]
pub struct UnknownRoute(pub String);

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::UploadsList => "/".to_string(),
            Route::UploadDetail(id) => format!("/upload/{}", id),
            Route::AdminDashboard => "/admin".to_string(),
            Route::AdminUsers => "/admin/users".to_string(),
        }
    }

    pub fn required_capability(&self) -> Capability {
        match self {
            Route::Login => Capability::Public,
            Route::UploadsList | Route::UploadDetail(_) => Capability::Authenticated,
            Route::AdminDashboard | Route::AdminUsers => Capability::Admin,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.path())
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Route::UploadsList),
            ["login"] => Ok(Route::Login),
            ["upload", id] => id
                .parse::<i64>()
                .map(Route::UploadDetail)
                .map_err(|_| UnknownRoute(trimmed.to_string())),
            ["admin"] => Ok(Route::AdminDashboard),
            ["admin", "users"] => Ok(Route::AdminUsers),
            _ => Err(UnknownRoute(trimmed.to_string())),
        }
    }
}

pub fn guard(state: &SessionState, capability: Capability) -> GuardDecision {
    match (capability, state) {
        (Capability::Public, _) => GuardDecision::Allow,
        (_, SessionState::Uninitialized | SessionState::Loading) => GuardDecision::Pending,
        (_, SessionState::Anonymous) => GuardDecision::RedirectTo(Route::Login),
        (Capability::Authenticated, SessionState::Authenticated(_)) => GuardDecision::Allow,
        (Capability::Admin, SessionState::Authenticated(user)) if user.is_admin => GuardDecision::Allow,
        (Capability::Admin, SessionState::Authenticated(_)) => GuardDecision::RedirectTo(Route::UploadsList),
    }
}

/// Follows redirects until a route is allowed or the session is still resolving.
/// Returns `None` while pending.
pub fn resolve(state: &SessionState, requested: Route) -> Option<Route> {
    let mut route = requested;
    // Redirect chains are at most admin -> home -> login
    for _ in 0..3 {
        match guard(state, route.required_capability()) {
            GuardDecision::Allow => return Some(route),
            GuardDecision::Pending => return None,
            GuardDecision::RedirectTo(next) => {
                tracing::debug!(from = %route, to = %next, "route guard redirect");
                route = next;
            }
        }
    }
    Some(route)
}
