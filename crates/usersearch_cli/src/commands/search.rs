use std::sync::Arc;
use std::time::Duration;

use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;
use usersearch::http::reqwest_transport::{DEFAULT_USER_AGENT, ReqwestTransport};
use usersearch::{
    ApiRateLimiter, EnrichmentPolicy, Gateway, SearchPresenter, SearchService, SeaOrmUserCache,
    UserCache, connect_and_migrate,
};

use crate::SearchOptions;
use crate::config::Config;

use super::users::UserRow;

/// Run a search, printing fresh or cached results.
pub(crate) async fn handle_search(
    opts: SearchOptions,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cache: Arc<dyn UserCache> = Arc::new(SeaOrmUserCache::new(
        connect_and_migrate(database_url).await?,
    ));
    let policy = resolve_policy(&opts, config);
    let service = build_service(config, cache)?.with_policy(policy);

    let token = opts
        .token
        .clone()
        .or_else(|| config.github_token())
        .unwrap_or_default();
    let should_cache = config.search.cache && !opts.no_cache;

    tracing::info!(
        query = %opts.query,
        authenticated = !token.is_empty(),
        cache = should_cache,
        policy = ?policy,
        "Searching users"
    );

    let spinner = start_spinner(&opts.query);
    let outcome = tokio::select! {
        outcome = service.search(&opts.query, &token, should_cache) => outcome,
        _ = tokio::signal::ctrl_c() => {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            eprintln!("Search cancelled.");
            std::process::exit(130);
        }
    };
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    let from_cache = !outcome.is_fresh();
    let mut presenter = SearchPresenter::new();
    presenter.apply(outcome);

    if let Some(message) = &presenter.error_message {
        eprintln!("{}", style(message).red());
    }
    if from_cache {
        eprintln!(
            "{}",
            style(format!("Showing {} cached users.", presenter.users.len())).dim()
        );
    }

    UserRow::print_many(&presenter.users, opts.output)?;
    Ok(())
}

/// Combine the configured policy with `--partial` and `--concurrency`.
fn resolve_policy(opts: &SearchOptions, config: &Config) -> EnrichmentPolicy {
    let concurrency = opts.concurrency.unwrap_or(config.search.concurrency);
    match config.search.enrichment_policy() {
        EnrichmentPolicy::PartialSuccess { .. } => EnrichmentPolicy::PartialSuccess { concurrency },
        EnrichmentPolicy::BatchAbort if opts.partial => {
            EnrichmentPolicy::PartialSuccess { concurrency }
        }
        EnrichmentPolicy::BatchAbort => EnrichmentPolicy::BatchAbort,
    }
}

fn build_service(
    config: &Config,
    cache: Arc<dyn UserCache>,
) -> Result<SearchService, Box<dyn std::error::Error>> {
    let user_agent = config
        .github
        .user_agent
        .as_deref()
        .unwrap_or(DEFAULT_USER_AGENT);
    let transport = ReqwestTransport::with_options(config.request_timeout(), user_agent)?;

    let mut gateway = Gateway::new(Arc::new(transport));
    if let Some(api_url) = &config.github.api_url {
        gateway = gateway.with_base_url(Url::parse(api_url)?);
    }
    if let Some(rps) = config.github.requests_per_second {
        gateway = gateway.with_rate_limiter(ApiRateLimiter::new(rps));
    }

    Ok(SearchService::new(gateway, cache))
}

fn start_spinner(query: &str) -> Option<ProgressBar> {
    if !Term::stdout().is_term() {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
    {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Searching GitHub for \"{query}\"..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::users::OutputFormat;
    use crate::config::PolicyName;

    fn opts(partial: bool, concurrency: Option<usize>) -> SearchOptions {
        SearchOptions {
            query: "Kevin".to_string(),
            token: None,
            no_cache: false,
            partial,
            concurrency,
            output: OutputFormat::Table,
        }
    }

    #[test]
    fn batch_abort_by_default() {
        let config = Config::default();
        assert_eq!(
            resolve_policy(&opts(false, Some(3)), &config),
            EnrichmentPolicy::BatchAbort
        );
    }

    #[test]
    fn partial_flag_uses_configured_concurrency() {
        let config = Config::default();
        assert_eq!(
            resolve_policy(&opts(true, None), &config),
            EnrichmentPolicy::PartialSuccess {
                concurrency: config.search.concurrency
            }
        );
    }

    #[test]
    fn concurrency_flag_overrides_config() {
        let mut config = Config::default();
        config.search.policy = PolicyName::Partial;
        assert_eq!(
            resolve_policy(&opts(false, Some(2)), &config),
            EnrichmentPolicy::PartialSuccess { concurrency: 2 }
        );
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let mut config = Config::default();
        config.github.api_url = Some("not a url".to_string());
        let cache: Arc<dyn UserCache> = Arc::new(usersearch::MemoryUserCache::new());
        assert!(build_service(&config, cache).is_err());
    }

    #[test]
    fn service_builds_with_rate_limit_and_custom_base() {
        let mut config = Config::default();
        config.github.api_url = Some("http://127.0.0.1:9000".to_string());
        config.github.requests_per_second = Some(5);
        let cache: Arc<dyn UserCache> = Arc::new(usersearch::MemoryUserCache::new());
        assert!(build_service(&config, cache).is_ok());
    }
}
