//! Create the `cached_users` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CachedUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CachedUsers::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CachedUsers::Login).string().not_null())
                    .col(ColumnDef::new(CachedUsers::AvatarUrl).text().not_null())
                    .col(
                        ColumnDef::new(CachedUsers::RepoCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cached_users_login")
                    .table(CachedUsers::Table)
                    .col(CachedUsers::Login)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CachedUsers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum CachedUsers {
    Table,
    Id,
    Login,
    AvatarUrl,
    RepoCount,
}
