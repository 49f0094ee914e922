use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Must match the ranked expression used by the post repository's search.
const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_posts_search ON posts USING GIN (\
    (setweight(to_tsvector('english', coalesce(title, '')), 'A') || \
     setweight(to_tsvector('english', coalesce(body, '')), 'B')))";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(CREATE_INDEX)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_posts_search")
            .await?;
        Ok(())
    }
}
