//! usersearch - GitHub user search with repository counts and an offline cache.
//!
//! A search issues one `/search/users` request, then one
//! `/search/repositories?q=user:<login>` request per hit, all concurrently,
//! and attaches the repository count to each user. Successful results are
//! written to a local cache, which is served instead whenever a search fails.
//!
//! # Features
//!
//! - `sqlite` / `postgres` - Database backends for [`SeaOrmUserCache`].
//! - `migrate` - Enables [`connect_and_migrate`] and the [`migration`] module.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use usersearch::{Gateway, SearchService, SeaOrmUserCache, connect_and_migrate};
//! use usersearch::http::reqwest_transport::ReqwestTransport;
//!
//! let db = connect_and_migrate("sqlite://usersearch.db?mode=rwc").await?;
//! let transport = ReqwestTransport::with_timeout(std::time::Duration::from_secs(30))?;
//! let service = SearchService::new(
//!     Gateway::new(Arc::new(transport)),
//!     Arc::new(SeaOrmUserCache::new(db)),
//! );
//!
//! let outcome = service.search("Kevin", "", true).await;
//! ```

pub mod cache;
pub mod db;
pub mod endpoint;
pub mod enrich;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod http;
pub mod models;
pub mod presenter;
pub mod rate_limit;
pub mod service;

#[cfg(feature = "migrate")]
pub mod migration;

pub use cache::{CacheError, MemoryUserCache, SeaOrmUserCache, UserCache};
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use endpoint::{Endpoint, EndpointError};
pub use enrich::{Enricher, EnrichmentPolicy};
pub use entity::prelude::*;
pub use error::ApiError;
pub use gateway::Gateway;
pub use http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
pub use models::{RepoRecord, SearchEnvelope, UserRecord};
pub use presenter::{SearchPresenter, user_message};
pub use rate_limit::{ApiRateLimiter, RateLimitInfo};
pub use service::{SearchOutcome, SearchService, Source};
