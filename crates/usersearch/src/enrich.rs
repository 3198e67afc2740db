//! Concurrent per-user repository counts.
//!
//! One repository search is issued per user, all in flight at once. How a
//! failing sub-request affects the batch is governed by [`EnrichmentPolicy`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::gateway::Gateway;
use crate::models::{RepoRecord, SearchEnvelope, UserRecord};

/// What to do when a per-user repository lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichmentPolicy {
    /// The first failure cancels every outstanding lookup and fails the batch.
    #[default]
    BatchAbort,
    /// Failures are logged and leave that user's count unchanged; at most
    /// `concurrency` lookups run at once.
    PartialSuccess { concurrency: usize },
}

type LookupResult = (i64, String, Result<i64>);

/// Fills in `repo_count` for a batch of users.
#[derive(Clone)]
pub struct Enricher {
    gateway: Gateway,
    policy: EnrichmentPolicy,
}

impl Enricher {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            policy: EnrichmentPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EnrichmentPolicy {
        self.policy
    }

    /// Look up the repository count of every user concurrently.
    ///
    /// The returned list has the same length and order as `users`. Users
    /// whose lookup URL cannot be built are skipped and keep their count.
    /// Records sharing an ID all receive that ID's count.
    pub async fn enrich(&self, users: Vec<UserRecord>, auth_token: &str) -> Result<Vec<UserRecord>> {
        if users.is_empty() {
            return Ok(users);
        }

        let semaphore = match self.policy {
            EnrichmentPolicy::BatchAbort => None,
            EnrichmentPolicy::PartialSuccess { concurrency } => {
                let concurrency = std::cmp::max(1, std::cmp::min(concurrency, users.len()));
                Some(Arc::new(Semaphore::new(concurrency)))
            }
        };

        let mut join_set: JoinSet<LookupResult> = JoinSet::new();

        for user in &users {
            let url = match self.gateway.resolve(&Endpoint::repos_by_owner(user.login.as_str())) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(login = %user.login, error = %e, "Skipping repository lookup");
                    continue;
                }
            };

            let gateway = self.gateway.clone();
            let semaphore = semaphore.clone();
            let token = auth_token.to_string();
            let id = user.id;
            let login = user.login.clone();

            join_set.spawn(async move {
                let _permit = match semaphore.as_deref() {
                    Some(semaphore) => match semaphore.acquire().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            return (
                                id,
                                login,
                                Err(ApiError::internal("Semaphore closed unexpectedly")),
                            );
                        }
                    },
                    None => None,
                };

                let result = count_repos(&gateway, &url, &token).await;
                (id, login, result)
            });
        }

        tracing::debug!(
            lookups = join_set.len(),
            policy = ?self.policy,
            "Counting repositories"
        );

        let mut counts: HashMap<i64, i64> = HashMap::with_capacity(join_set.len());
        let mut failures = 0usize;

        while let Some(joined) = join_set.join_next().await {
            let failure = match joined {
                Ok((id, _, Ok(count))) => {
                    counts.insert(id, count);
                    continue;
                }
                Ok((_, login, Err(e))) => {
                    tracing::warn!(login = %login, error = %e, "Repository lookup failed");
                    e
                }
                Err(e) => {
                    tracing::error!(error = %e, "Repository lookup task failed");
                    ApiError::internal(format!("Task panic: {e}"))
                }
            };

            if self.policy == EnrichmentPolicy::BatchAbort {
                join_set.abort_all();
                return Err(failure);
            }
            failures += 1;
        }

        if failures > 0 {
            tracing::info!(
                enriched = counts.len(),
                failed = failures,
                "Repository counts partially updated"
            );
        }

        Ok(users
            .into_iter()
            .map(|mut user| {
                if let Some(count) = counts.get(&user.id) {
                    user.repo_count = *count;
                }
                user
            })
            .collect())
    }
}

/// Number of repositories in the first page of a `user:<login>` search.
async fn count_repos(gateway: &Gateway, url: &Url, auth_token: &str) -> Result<i64> {
    let response = gateway.get(url, auth_token).await?;
    let repos = SearchEnvelope::<RepoRecord>::from_slice(&response.body)?.into_items()?;
    Ok(i64::try_from(repos.len()).unwrap_or(i64::MAX))
}
