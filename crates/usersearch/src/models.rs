//! Wire and domain types for GitHub search results.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// A GitHub user as returned by `/search/users`, plus its repository count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// GitHub's numeric user ID (stable identity key).
    pub id: i64,
    pub login: String,
    pub avatar_url: String,
    /// Number of public repositories; stays at its prior value when enrichment fails.
    #[serde(default)]
    pub repo_count: i64,
}

impl UserRecord {
    pub fn new(id: i64, login: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            avatar_url: avatar_url.into(),
            repo_count: 0,
        }
    }

    #[must_use]
    pub fn with_repo_count(mut self, repo_count: i64) -> Self {
        self.repo_count = repo_count;
        self
    }
}

/// A repository search hit; only used for counting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoRecord {
    pub id: i64,
}

/// Envelope returned by the search endpoints.
///
/// `items` absent is a distinct state from an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchEnvelope<T> {
    pub total_count: u64,
    pub items: Option<Vec<T>>,
}

impl<T> SearchEnvelope<T> {
    /// Take the items, failing with `InvalidResponse` when the field was absent.
    pub fn into_items(self) -> Result<Vec<T>> {
        self.items.ok_or(ApiError::InvalidResponse)
    }
}

impl<T: serde::de::DeserializeOwned> SearchEnvelope<T> {
    /// Decode an envelope from a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode search envelope");
            ApiError::InvalidResponse
        })
    }
}
