//! usersearch CLI - search GitHub users and browse the offline cache.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::users::OutputFormat;

#[derive(Parser)]
#[command(name = "usersearch")]
#[command(version)]
#[command(about = "Search GitHub users and count their repositories")]
#[command(
    long_about = "usersearch looks up GitHub users by name, counts each match's public \
repositories concurrently, and keeps the last successful results in a local cache. \
When GitHub cannot be reached or rejects a request, the cached users are shown instead."
)]
#[command(after_long_help = r#"EXAMPLES
    Search for users named Kevin:
        $ usersearch search Kevin

    Tolerate individual repository lookups failing:
        $ usersearch search Kevin --partial -c 4

    Show cached users whose login contains "kev":
        $ usersearch cached --login kev

    Generate shell completions:
        $ usersearch completions bash > ~/.local/share/bash-completion/completions/usersearch

CONFIGURATION
    usersearch reads configuration from:
      1. ~/.config/usersearch/config.toml (or $XDG_CONFIG_HOME/usersearch/config.toml)
      2. ./usersearch.toml
      3. Environment variables (USERSEARCH_* prefix, e.g., USERSEARCH_GITHUB__API_URL)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    USERSEARCH_DATABASE_URL   Cache database (default: ~/.local/state/usersearch/usersearch.db)
    USERSEARCH_GITHUB_TOKEN   GitHub personal access token
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search GitHub users by name
    Search {
        #[command(flatten)]
        opts: SearchOptions,
    },
    /// List cached users
    Cached {
        /// Only users whose login contains this text (case-insensitive)
        #[arg(short, long)]
        login: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Drop the cache tables and recreate them
    Fresh,
}

/// Options for the search command.
#[derive(Debug, Clone, clap::Args)]
struct SearchOptions {
    /// Name to search for
    query: String,

    /// GitHub token (overrides config)
    #[arg(long, env = "USERSEARCH_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Don't write results to the cache
    #[arg(long)]
    no_cache: bool,

    /// Keep going when a repository lookup fails
    #[arg(long)]
    partial: bool,

    /// Maximum concurrent repository lookups with --partial (default from config or 8)
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("usersearch=info,usersearch_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database location; set USERSEARCH_DATABASE_URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Search { opts } => {
            commands::search::handle_search(opts, &config, &database_url).await?;
        }
        Commands::Cached { login, output } => {
            commands::cached::handle_cached(login, output, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_parses_flags() {
        let cli = Cli::try_parse_from([
            "usersearch",
            "search",
            "Kevin",
            "--no-cache",
            "--partial",
            "-c",
            "3",
            "-o",
            "json",
        ])
        .expect("search args should parse");

        let Commands::Search { opts } = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(opts.query, "Kevin");
        assert!(opts.no_cache);
        assert!(opts.partial);
        assert_eq!(opts.concurrency, Some(3));
        assert!(matches!(opts.output, OutputFormat::Json));
    }

    #[test]
    fn search_requires_a_query() {
        assert!(Cli::try_parse_from(["usersearch", "search"]).is_err());
    }

    #[test]
    fn cached_accepts_login_filter() {
        let cli = Cli::try_parse_from(["usersearch", "cached", "--login", "kev"])
            .expect("cached args should parse");
        assert!(matches!(
            cli.command,
            Commands::Cached { login: Some(ref l), .. } if l == "kev"
        ));
    }
}
