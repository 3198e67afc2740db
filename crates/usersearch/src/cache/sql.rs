use async_trait::async_trait;
use sea_orm::{
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::{Expr, Func, LikeExpr, OnConflict},
};

use crate::entity::cached_user::{ActiveModel, Column, Entity as CachedUser};
use crate::models::UserRecord;

use super::{Result, UserCache, dedup_by_id};

/// Rows per INSERT statement, keeping well under SQLite's bind limit.
const UPSERT_CHUNK_SIZE: usize = 100;

/// [`UserCache`] over a sea-orm connection (SQLite or PostgreSQL).
#[derive(Debug)]
pub struct SeaOrmUserCache {
    db: DatabaseConnection,
}

impl SeaOrmUserCache {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

const LIKE_ESCAPE: char = '\\';

/// `%fragment%` with LIKE metacharacters escaped, so the fragment matches literally.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Build the ON CONFLICT clause used by upsert.
///
/// The GitHub user ID is the identity key; every other column is replaced.
pub(crate) fn build_upsert_on_conflict() -> OnConflict {
    OnConflict::column(Column::Id)
        .update_columns([Column::Login, Column::AvatarUrl, Column::RepoCount])
        .to_owned()
}

#[async_trait]
impl UserCache for SeaOrmUserCache {
    async fn upsert(&self, users: &[UserRecord]) -> Result<u64> {
        let deduped = dedup_by_id(users);
        if deduped.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        for chunk in deduped.chunks(UPSERT_CHUNK_SIZE) {
            let models: Vec<ActiveModel> = chunk.iter().map(|user| ActiveModel::from(*user)).collect();
            CachedUser::insert_many(models)
                .on_conflict(build_upsert_on_conflict())
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        tracing::debug!(count = deduped.len(), "Cached users");
        Ok(deduped.len() as u64)
    }

    async fn load_all(&self) -> Result<Vec<UserRecord>> {
        let models = CachedUser::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(UserRecord::from).collect())
    }

    async fn find_by_login(&self, fragment: &str) -> Result<Vec<UserRecord>> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return self.load_all().await;
        }

        let models = CachedUser::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(Column::Login)))
                    .like(LikeExpr::new(contains_pattern(&needle)).escape(LIKE_ESCAPE)),
            )
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(UserRecord::from).collect())
    }
}
