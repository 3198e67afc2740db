use usersearch::{SeaOrmUserCache, UserCache, connect_and_migrate};

use super::users::{OutputFormat, UserRow};

/// List cached users, optionally filtered by a login fragment.
pub(crate) async fn handle_cached(
    login: Option<String>,
    output: OutputFormat,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cache = SeaOrmUserCache::new(connect_and_migrate(database_url).await?);

    let users = match login.as_deref() {
        Some(fragment) => cache.find_by_login(fragment).await?,
        None => cache.load_all().await?,
    };

    tracing::debug!(count = users.len(), "Loaded cached users");
    UserRow::print_many(&users, output)?;
    Ok(())
}
