//! Mapping from logical GitHub requests to fully qualified URLs.

use std::sync::LazyLock;

use thiserror::Error;
use url::Url;

/// Public GitHub REST API host.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const SEARCH_USERS_PATH: &str = "/search/users";
const SEARCH_REPOS_PATH: &str = "/search/repositories";
const QUERY_PARAM: &str = "q";
const OWNER_QUALIFIER: &str = "user:";

static DEFAULT_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_API_URL).expect("default API URL is valid"));

/// The public GitHub API root as a parsed URL.
pub fn default_base_url() -> Url {
    DEFAULT_BASE.clone()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("base URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid search term: {0:?}")]
    InvalidTerm(String),
}

/// A logical request against the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Users whose name matches `query`.
    UserSearch { query: String },
    /// Repositories owned by `owner`.
    RepoSearchByOwner { owner: String },
}

impl Endpoint {
    pub fn user_search(query: impl Into<String>) -> Self {
        Self::UserSearch {
            query: query.into(),
        }
    }

    pub fn repos_by_owner(owner: impl Into<String>) -> Self {
        Self::RepoSearchByOwner {
            owner: owner.into(),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::UserSearch { .. } => SEARCH_USERS_PATH,
            Self::RepoSearchByOwner { .. } => SEARCH_REPOS_PATH,
        }
    }

    /// Query parameters as `(name, value)` pairs, unencoded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::UserSearch { query } => vec![(QUERY_PARAM, query.clone())],
            Self::RepoSearchByOwner { owner } => {
                vec![(QUERY_PARAM, format!("{OWNER_QUALIFIER}{owner}"))]
            }
        }
    }

    fn term(&self) -> &str {
        match self {
            Self::UserSearch { query } => query,
            Self::RepoSearchByOwner { owner } => owner,
        }
    }

    /// Resolve against the public GitHub API.
    pub fn resolve(&self) -> Result<Url, EndpointError> {
        self.resolve_with_base(&DEFAULT_BASE)
    }

    /// Resolve against `base`, replacing its path and query.
    pub fn resolve_with_base(&self, base: &Url) -> Result<Url, EndpointError> {
        if base.host_str().is_none_or(str::is_empty) {
            return Err(EndpointError::MissingHost(base.to_string()));
        }

        let term = self.term();
        if term.trim().is_empty() || term.chars().any(char::is_control) {
            return Err(EndpointError::InvalidTerm(term.to_string()));
        }

        let mut url = base.clone();
        url.set_path(self.path());
        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        Ok(url)
    }
}
