//! View models: fetch state for each page, independent of how it is drawn.
//!
//! Each view owns a [`Resource`], which holds the load state on a `watch`
//! channel and discards responses that arrive after the view moved on (a
//! newer fetch was issued, or the view was unmounted).

pub mod admin;
pub mod detail;
pub mod uploads;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::ClientResult;

pub use admin::{AdminDashboardView, AssumeYes, Confirm, DashboardDisplay, UserManagementView, UsersDisplay};
pub use detail::{DetailDisplay, ResultCard, UploadDetailView};
pub use uploads::{UploadRow, UploadsListDisplay, UploadsListView};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    /// `previous` keeps the last good data visible during a refresh
    Loading { previous: Option<T> },
    Loaded(T),
    Failed { message: String, previous: Option<T> },
}

impl<T> LoadState<T> {
    /// Latest good data, whatever the current phase
    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            LoadState::Loading { previous } | LoadState::Failed { previous, .. } => previous.as_ref(),
            LoadState::Idle => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Visual weight of a badge or score; front ends pick the colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Muted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Whether a fetch result reached the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Applied,
    /// A newer fetch superseded this one, or the view was unmounted
    Stale,
}

/// Identifies one request issued by one view instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    view: Uuid,
    generation: u64,
}

/// Issues tickets and decides whether a response may still be applied
#[derive(Debug, Clone)]
pub struct RequestTracker {
    view: Uuid,
    generation: Arc<AtomicU64>,
    mounted: Arc<AtomicBool>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            view: Uuid::new_v4(),
            generation: Arc::new(AtomicU64::new(0)),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn issue(&self) -> Ticket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { view: self.view, generation }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.view == self.view
            && self.mounted.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Load state plus stale-response protection for one piece of remote data
pub struct Resource<T> {
    state: watch::Sender<LoadState<T>>,
    tracker: RequestTracker,
}

impl<T: Clone> Resource<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self { state, tracker: RequestTracker::new() }
    }

    pub fn snapshot(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    pub fn unmount(&self) {
        self.tracker.unmount();
    }

    pub fn is_mounted(&self) -> bool {
        self.tracker.is_mounted()
    }

    /// Runs `request` and applies its outcome if it is still the latest one.
    /// Failures become `Failed` with `failure_message`; no retry.
    pub async fn load<F>(&self, request: F, failure_message: &str) -> Fetch
    where
        F: Future<Output = ClientResult<T>>,
    {
        if !self.tracker.is_mounted() {
            return Fetch::Stale;
        }
        let ticket = self.tracker.issue();
        self.state.send_modify(|state| {
            let previous = state.data().cloned();
            *state = LoadState::Loading { previous };
        });

        let result = request.await;

        if !self.tracker.is_current(&ticket) {
            tracing::debug!(?ticket, "discarding stale response");
            return Fetch::Stale;
        }

        match result {
            Ok(data) => {
                self.state.send_replace(LoadState::Loaded(data));
            }
            Err(e) => {
                tracing::warn!(error = %e, "view fetch failed");
                self.state.send_modify(|state| {
                    let previous = state.data().cloned();
                    *state = LoadState::Failed {
                        message: failure_message.to_string(),
                        previous,
                    };
                });
            }
        }
        Fetch::Applied
    }
}

impl<T: Clone> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}
