//! Configuration file support for usersearch.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. `USERSEARCH_DATABASE_URL` and `USERSEARCH_GITHUB_TOKEN`
//! 3. Environment variables with a `USERSEARCH_` prefix and `__` between
//!    section and key, e.g. `USERSEARCH_GITHUB__API_URL`
//! 4. Config file (./usersearch.toml, then ~/.config/usersearch/config.toml)
//! 5. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/usersearch/usersearch.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/usersearch/usersearch.db"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."  # or use USERSEARCH_GITHUB_TOKEN env var
//! api_url = "https://api.github.com"
//! timeout_secs = 30
//! requests_per_second = 5
//!
//! [search]
//! cache = true
//! policy = "batch_abort"  # or "partial"
//! concurrency = 8
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use serde::Deserialize;
use usersearch::EnrichmentPolicy;

const APP_NAME: &str = "usersearch";
const ENV_PREFIX: &str = "USERSEARCH";

/// Single-underscore variables that map onto nested keys.
const ENV_ALIASES: [(&str, &str); 2] = [
    ("USERSEARCH_DATABASE_URL", "database.url"),
    ("USERSEARCH_GITHUB_TOKEN", "github.token"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub search: SearchConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// GitHub API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token; requests are anonymous without one.
    pub token: Option<String>,
    /// API root, for GitHub Enterprise or a local stub.
    pub api_url: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Proactive request pacing; unlimited when unset.
    pub requests_per_second: Option<u32>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: None,
            timeout_secs: 30,
            user_agent: None,
            requests_per_second: None,
        }
    }
}

/// How repository-count failures are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyName {
    /// Any failed lookup fails the search.
    #[default]
    BatchAbort,
    /// Failed lookups keep their previous count.
    Partial,
}

/// Default search options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Write successful results to the local cache.
    pub cache: bool,
    pub policy: PolicyName,
    /// Concurrent lookups under the partial policy.
    pub concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache: true,
            policy: PolicyName::default(),
            concurrency: 8,
        }
    }
}

impl SearchConfig {
    pub fn enrichment_policy(&self) -> EnrichmentPolicy {
        match self.policy {
            PolicyName::BatchAbort => EnrichmentPolicy::BatchAbort,
            PolicyName::Partial => EnrichmentPolicy::PartialSuccess {
                concurrency: self.concurrency,
            },
        }
    }
}

impl Config {
    /// Load configuration from files and the process environment.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("usersearch.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./usersearch.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        match with_environment(builder, environment(), |name| std::env::var(name).ok()) {
            Ok(builder) => Self::build(builder),
            Err(e) => {
                tracing::warn!("Failed to apply environment overrides: {}", e);
                Config::default()
            }
        }
    }

    fn build(builder: Builder<DefaultState>) -> Self {
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("usersearch.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout_secs.max(1))
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/usersearch` or `~/.local/state/usersearch`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Add the prefixed environment source, then the single-underscore aliases on top.
fn with_environment(
    builder: Builder<DefaultState>,
    env: Environment,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Builder<DefaultState>, ConfigError> {
    let mut builder = builder.add_source(env);
    for (name, key) in ENV_ALIASES {
        if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
            builder = builder.set_override(key, value)?;
        }
    }
    Ok(builder)
}
