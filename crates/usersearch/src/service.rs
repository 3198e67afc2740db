//! The search pipeline: fetch, enrich, cache, and fall back to the cache on failure.

use std::sync::Arc;

use crate::cache::{self, UserCache};
use crate::endpoint::Endpoint;
use crate::enrich::{Enricher, EnrichmentPolicy};
use crate::error::{ApiError, Result};
use crate::gateway::Gateway;
use crate::models::{SearchEnvelope, UserRecord};

/// Where the users in a [`SearchOutcome`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched and enriched just now.
    Fresh,
    /// Loaded from the local cache because the search failed.
    Cache { reason: ApiError },
}

/// Result of [`SearchService::search`]; always carries a user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub users: Vec<UserRecord>,
    pub source: Source,
}

impl SearchOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self.source, Source::Fresh)
    }

    /// The failure to surface to the user, if any.
    ///
    /// Being offline is not reported; the cached list speaks for itself.
    pub fn error(&self) -> Option<&ApiError> {
        match &self.source {
            Source::Cache { reason } if !reason.is_offline() => Some(reason),
            _ => None,
        }
    }
}

/// Runs user searches against GitHub and keeps the local cache current.
#[derive(Clone)]
pub struct SearchService {
    gateway: Gateway,
    enricher: Enricher,
    cache: Arc<dyn UserCache>,
}

impl SearchService {
    pub fn new(gateway: Gateway, cache: Arc<dyn UserCache>) -> Self {
        Self {
            enricher: Enricher::new(gateway.clone()),
            gateway,
            cache,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.enricher = self.enricher.with_policy(policy);
        self
    }

    pub fn cache(&self) -> &Arc<dyn UserCache> {
        &self.cache
    }

    /// Search users by name and attach repository counts.
    ///
    /// When `should_cache` is set, a fully successful result is written to
    /// the cache. A failed cache write is logged and otherwise ignored.
    pub async fn fetch_users(
        &self,
        query: &str,
        auth_token: &str,
        should_cache: bool,
    ) -> Result<Vec<UserRecord>> {
        let url = self
            .gateway
            .resolve(&Endpoint::user_search(query))
            .map_err(|e| {
                tracing::debug!(query, error = %e, "Cannot build search URL");
                ApiError::InvalidRequest
            })?;

        let response = self.gateway.get(&url, auth_token).await?;
        let users = SearchEnvelope::<UserRecord>::from_slice(&response.body)?.into_items()?;
        tracing::debug!(query, count = users.len(), "Users found");

        let users = self.enricher.enrich(users, auth_token).await?;

        if should_cache && let Err(e) = self.cache.upsert(&users).await {
            tracing::warn!(error = %e, "Failed to cache search results");
        }

        Ok(users)
    }

    /// Search, falling back to the full cache contents on any failure.
    pub async fn search(&self, query: &str, auth_token: &str, should_cache: bool) -> SearchOutcome {
        match self.fetch_users(query, auth_token, should_cache).await {
            Ok(users) => SearchOutcome {
                users,
                source: Source::Fresh,
            },
            Err(reason) => {
                tracing::warn!(query, error = %reason, "Search failed, using cached users");
                let users = self.cached_users().await.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to load cached users");
                    Vec::new()
                });
                SearchOutcome {
                    users,
                    source: Source::Cache { reason },
                }
            }
        }
    }

    /// Everything in the cache, ordered by ID.
    pub async fn cached_users(&self) -> cache::Result<Vec<UserRecord>> {
        self.cache.load_all().await
    }

    /// Cached users whose login contains `fragment`, ignoring case.
    pub async fn search_cached(&self, fragment: &str) -> cache::Result<Vec<UserRecord>> {
        self.cache.find_by_login(fragment).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cache::{CacheError, MemoryUserCache};
    use crate::http::{HttpError, HttpResponse, MockTransport, json_response};

    fn users_url(query: &str) -> String {
        Endpoint::user_search(query).resolve().unwrap().to_string()
    }

    fn repos_url(login: &str) -> String {
        Endpoint::repos_by_owner(login).resolve().unwrap().to_string()
    }

    fn repos_body(n: usize) -> serde_json::Value {
        let items: Vec<_> = (0..n).map(|i| json!({"id": 100 + i})).collect();
        json!({"total_count": n, "items": items})
    }

    fn kevin_users() -> serde_json::Value {
        json!({
            "total_count": 2,
            "items": [
                {"id": 1, "login": "kevin", "avatar_url": "https://a/1"},
                {"id": 2, "login": "kevinh", "avatar_url": "https://a/2"}
            ]
        })
    }

    fn service(transport: &MockTransport, cache: Arc<dyn UserCache>) -> SearchService {
        SearchService::new(Gateway::new(Arc::new(transport.clone())), cache)
    }

    fn script_kevin(transport: &MockTransport) {
        transport.push_json(users_url("Kevin"), kevin_users());
        transport.push_json(repos_url("kevin"), repos_body(5));
        transport.push_json(repos_url("kevinh"), repos_body(0));
    }

    #[tokio::test]
    async fn fresh_search_enriches_and_caches() {
        let transport = MockTransport::new();
        script_kevin(&transport);
        let cache = Arc::new(MemoryUserCache::new());

        let outcome = service(&transport, cache.clone())
            .search("Kevin", "tok", true)
            .await;

        let expected = vec![
            UserRecord::new(1, "kevin", "https://a/1").with_repo_count(5),
            UserRecord::new(2, "kevinh", "https://a/2").with_repo_count(0),
        ];
        assert!(outcome.is_fresh());
        assert_eq!(outcome.error(), None);
        assert_eq!(outcome.users, expected);
        assert_eq!(cache.load_all().await.unwrap(), expected);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(
            requests
                .iter()
                .all(|r| r.header_value("authorization") == Some("Bearer tok"))
        );
    }

    #[tokio::test]
    async fn should_cache_false_leaves_cache_untouched() {
        let transport = MockTransport::new();
        script_kevin(&transport);
        let cache = Arc::new(MemoryUserCache::new());

        let users = service(&transport, cache.clone())
            .fetch_users("Kevin", "", false)
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert!(cache.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_falls_back_to_cache_without_an_error() {
        let transport = MockTransport::new();
        transport.push_error(users_url("Kevin"), HttpError::Offline("unreachable".to_string()));
        let cache = Arc::new(MemoryUserCache::new());
        let cached = vec![
            UserRecord::new(9, "kev", "https://a/9").with_repo_count(2),
        ];
        cache.upsert(&cached).await.unwrap();

        let outcome = service(&transport, cache).search("Kevin", "", true).await;
        assert_eq!(outcome.users, cached);
        assert_eq!(
            outcome.source,
            Source::Cache {
                reason: ApiError::NoInternet
            }
        );
        assert_eq!(outcome.error(), None);
    }

    #[tokio::test]
    async fn missing_items_falls_back_with_invalid_response() {
        let transport = MockTransport::new();
        transport.push_json(users_url("Kevin"), json!({"total_count": 0}));
        let cache = Arc::new(MemoryUserCache::new());
        cache
            .upsert(&[UserRecord::new(3, "old", "https://a/3")])
            .await
            .unwrap();

        let outcome = service(&transport, cache).search("Kevin", "", true).await;
        assert_eq!(outcome.error(), Some(&ApiError::InvalidResponse));
        assert_eq!(outcome.users.len(), 1);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_enrichment_does_not_write_cache() {
        let transport = MockTransport::new();
        transport.push_json(users_url("Kevin"), kevin_users());
        transport.push_json(repos_url("kevin"), repos_body(5));
        transport.push_response(
            repos_url("kevinh"),
            HttpResponse {
                status: 403,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );
        let cache = Arc::new(MemoryUserCache::new());

        let outcome = service(&transport, cache.clone())
            .search("Kevin", "", true)
            .await;
        assert_eq!(outcome.error(), Some(&ApiError::Unauthorized));
        assert!(outcome.users.is_empty());
        assert!(cache.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_policy_still_caches_what_succeeded() {
        let transport = MockTransport::new();
        transport.push_json(users_url("Kevin"), kevin_users());
        transport.push_json(repos_url("kevin"), repos_body(5));
        transport.push_response(repos_url("kevinh"), json_response(500, &json!({})));
        let cache = Arc::new(MemoryUserCache::new());

        let outcome = service(&transport, cache.clone())
            .with_policy(EnrichmentPolicy::PartialSuccess { concurrency: 4 })
            .search("Kevin", "", true)
            .await;
        assert!(outcome.is_fresh());
        let counts: Vec<_> = outcome.users.iter().map(|u| u.repo_count).collect();
        assert_eq!(counts, vec![5, 0]);
        assert_eq!(cache.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_query_is_an_invalid_request_without_network() {
        let transport = MockTransport::new();
        let err = service(&transport, Arc::new(MemoryUserCache::new()))
            .fetch_users("   ", "", true)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::InvalidRequest);
        assert!(transport.requests().is_empty());
    }

    struct BrokenCache;

    #[async_trait]
    impl UserCache for BrokenCache {
        async fn upsert(&self, _users: &[UserRecord]) -> cache::Result<u64> {
            Err(CacheError::Unavailable("read-only".to_string()))
        }

        async fn load_all(&self) -> cache::Result<Vec<UserRecord>> {
            Err(CacheError::Unavailable("read-only".to_string()))
        }

        async fn find_by_login(&self, _fragment: &str) -> cache::Result<Vec<UserRecord>> {
            Err(CacheError::Unavailable("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn cache_write_failure_does_not_fail_the_search() {
        let transport = MockTransport::new();
        script_kevin(&transport);

        let outcome = service(&transport, Arc::new(BrokenCache))
            .search("Kevin", "", true)
            .await;
        assert!(outcome.is_fresh());
        assert_eq!(outcome.users.len(), 2);
    }

    #[tokio::test]
    async fn cache_load_failure_yields_empty_fallback() {
        let transport = MockTransport::new();
        transport.push_error(users_url("Kevin"), HttpError::Transport("reset".to_string()));

        let outcome = service(&transport, Arc::new(BrokenCache))
            .search("Kevin", "", true)
            .await;
        assert!(outcome.users.is_empty());
        assert!(matches!(outcome.error(), Some(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn search_cached_filters_by_login() {
        let transport = MockTransport::new();
        let cache = Arc::new(MemoryUserCache::new());
        cache
            .upsert(&[
                UserRecord::new(1, "Kevin", "https://a/1"),
                UserRecord::new(2, "alice", "https://a/2"),
            ])
            .await
            .unwrap();

        let svc = service(&transport, cache);
        assert_eq!(svc.cached_users().await.unwrap().len(), 2);
        let hits = svc.search_cached("kev").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].login, "Kevin");
    }
}
