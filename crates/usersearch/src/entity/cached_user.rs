//! CachedUser entity - the last successful search results, keyed by GitHub user ID.

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::UserRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cached_users")]
pub struct Model {
    /// GitHub's numeric user ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub login: String,

    #[sea_orm(column_type = "Text")]
    pub avatar_url: String,

    pub repo_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            login: model.login,
            avatar_url: model.avatar_url,
            repo_count: model.repo_count,
        }
    }
}

impl From<&UserRecord> for ActiveModel {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: Set(user.id),
            login: Set(user.login.clone()),
            avatar_url: Set(user.avatar_url.clone()),
            repo_count: Set(user.repo_count),
        }
    }
}
