//! Idempotent schema bootstrap, run once at startup.

use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbConn, DbErr, Schema};

use super::entity::{post, post_like, post_view};

pub const LIKE_IDENTITY_INDEX: &str = "idx_post_likes_post_ip";

pub fn table_statements(schema: &Schema) -> Vec<TableCreateStatement> {
    vec![
        schema
            .create_table_from_entity(post::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(post_like::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(post_view::Entity)
            .if_not_exists()
            .to_owned(),
    ]
}

pub fn index_statements() -> Vec<IndexCreateStatement> {
    vec![
        // At most one like per identity and post; this decides concurrent likes.
        Index::create()
            .if_not_exists()
            .name(LIKE_IDENTITY_INDEX)
            .table(post_like::Entity)
            .col(post_like::Column::PostId)
            .col(post_like::Column::IpAddress)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_post_views_post_id")
            .table(post_view::Entity)
            .col(post_view::Column::PostId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_posts_created_at")
            .table(post::Entity)
            .col(post::Column::CreatedAt)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_posts_published")
            .table(post::Entity)
            .col(post::Column::Published)
            .to_owned(),
    ]
}

/// Create tables and indexes that do not exist yet. Safe to run on every start.
pub async fn ensure_schema(db: &DbConn) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    for statement in table_statements(&schema) {
        db.execute(backend.build(&statement)).await?;
    }
    for statement in index_statements() {
        db.execute(backend.build(&statement)).await?;
    }

    tracing::info!("Database schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseBackend;

    #[test]
    fn test_like_index_is_unique_on_post_and_identity() {
        let backend = DatabaseBackend::Postgres;
        let sql = backend.build(&index_statements()[0]).to_string();

        assert!(sql.contains("CREATE UNIQUE INDEX IF NOT EXISTS"));
        assert!(sql.contains(LIKE_IDENTITY_INDEX));
        assert!(sql.contains(r#""post_id", "ip_address""#));
    }

    #[test]
    fn test_tables_are_created_if_missing() {
        let backend = DatabaseBackend::Postgres;
        let schema = Schema::new(backend);

        let sql: Vec<String> = table_statements(&schema)
            .iter()
            .map(|s| backend.build(s).to_string())
            .collect();

        assert_eq!(sql.len(), 3);
        assert!(sql.iter().all(|s| s.starts_with("CREATE TABLE IF NOT EXISTS")));
        assert!(sql[0].contains(r#""posts""#) && sql[0].contains("UNIQUE"));
        assert!(sql[1].contains("FOREIGN KEY"));
    }
}
