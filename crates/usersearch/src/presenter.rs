//! View state for a search screen, and the messages shown for each failure.

use crate::cache::UserCache;
use crate::error::ApiError;
use crate::models::UserRecord;
use crate::service::SearchOutcome;

/// Text shown to the user for an [`ApiError`].
pub fn user_message(error: &ApiError) -> &'static str {
    match error {
        ApiError::InvalidRequest => "Invalid Search string",
        ApiError::InvalidResponse => "Unable to decode response from server.",
        ApiError::RateLimitExceeded => "Rate Limit Exceeded. Please refresh Authorization Token.",
        ApiError::Unauthorized => "Unauthorized access. Please refresh Authorization Token.",
        ApiError::NoInternet => "No Internet Connection. Using Cached Data.",
        ApiError::Transport(_) | ApiError::Internal(_) => "Unable to reach the server.",
    }
}

/// The user list and pending error banner of a search screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPresenter {
    pub users: Vec<UserRecord>,
    pub error_message: Option<String>,
}

impl SearchPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the outcome of a search.
    pub fn apply(&mut self, outcome: SearchOutcome) {
        self.error_message = outcome.error().map(|e| user_message(e).to_string());
        self.users = outcome.users;
    }

    /// Clear the banner and show whatever is cached.
    ///
    /// This never retries the network.
    pub async fn dismiss_error(&mut self, cache: &dyn UserCache) {
        self.error_message = None;
        self.restore_from_cache(cache).await;
    }

    /// Show the cached users, e.g. on start-up before any search.
    pub async fn restore_from_cache(&mut self, cache: &dyn UserCache) {
        match cache.load_all().await {
            Ok(users) => self.users = users,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cached users");
                self.users.clear();
            }
        }
    }
}
