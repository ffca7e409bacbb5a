//! Persistence layer: entity definitions, migrations and the connection pool used by the rest of StoryQuest.

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, SqlxSqliteConnector};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod entity;

pub use sea_orm;

/// Primary key type shared by every table.
pub type DbId = i32;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Retrieve the embedded migrations for the StoryQuest schema.
pub fn migrate() -> &'static Migrator {
    &MIGRATOR
}

/// A connection which is only used for reading.
///
/// Purely a marker so function signatures document whether they mutate state.
pub trait ReadConnection: ConnectionTrait {}

/// A connection which may mutate the database.
pub trait WriteConnection: ReadConnection {}

impl ReadConnection for DatabaseConnection {}
impl WriteConnection for DatabaseConnection {}
impl ReadConnection for DatabaseTransaction {}
impl WriteConnection for DatabaseTransaction {}

/// SQLite only allows a single writer at a time, we therefore keep a separate (small) writer pool next to the reader pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    writer: DatabaseConnection,
    reader: DatabaseConnection,
    sqlx_writer: SqlitePool,
}

impl DatabasePool {
    /// Create a new pool with distinct writer and reader connections.
    pub async fn new_sqlite(options: SqliteConnectOptions, writers: u32, readers: u32) -> eyre::Result<Self> {
        let writer_pool = SqlitePoolOptions::new()
            .max_connections(writers)
            .connect_with(options.clone())
            .await?;
        let reader_pool = SqlitePoolOptions::new()
            .max_connections(readers)
            .connect_with(options)
            .await?;

        tracing::debug!(writers, readers, "Opened SQLite pools");

        Ok(Self {
            writer: SqlxSqliteConnector::from_sqlx_sqlite_pool(writer_pool.clone()),
            reader: SqlxSqliteConnector::from_sqlx_sqlite_pool(reader_pool),
            sqlx_writer: writer_pool,
        })
    }

    /// Create a pool where readers and writers share one connection.
    ///
    /// Required for in-memory databases, as every new connection would otherwise see its own empty database.
    pub async fn new_sqlite_shared(options: SqliteConnectOptions) -> eyre::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());

        Ok(Self {
            writer: conn.clone(),
            reader: conn,
            sqlx_writer: pool,
        })
    }

    pub fn reader(&self) -> &DatabaseConnection {
        &self.reader
    }

    pub fn writer(&self) -> &DatabaseConnection {
        &self.writer
    }

    pub fn get_sqlx_sqlite_writer(&self) -> &SqlitePool {
        &self.sqlx_writer
    }

    /// Close both pools, waiting for outstanding connections to be returned.
    pub async fn close(&self) {
        self.sqlx_writer.close().await;
        if let Err(e) = self.reader.clone().close().await {
            tracing::warn!(?e, "Failed to close reader pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{sea_orm_active_enums::UserRole, users};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};

    #[tokio::test]
    async fn migrations_apply_to_fresh_database() -> eyre::Result<()> {
        let options = "sqlite::memory:".parse::<SqliteConnectOptions>()?.foreign_keys(true);
        let pool = DatabasePool::new_sqlite_shared(options).await?;
        migrate().run(pool.get_sqlx_sqlite_writer()).await?;

        let new_user = |username: &str| {
            let now = chrono::Utc::now();
            users::ActiveModel {
                username: Set(username.into()),
                email: Set("tester@example.com".into()),
                password_hash: Set("hash".into()),
                role: Set(UserRole::Player),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
        };
        let user = new_user("tester").insert(pool.writer()).await?;

        let found = users::Entity::find_by_id(user.id).one(pool.reader()).await?;
        assert_eq!(found.map(|u| u.username), Some("tester".to_string()));

        // Emails are unique
        assert!(new_user("other").insert(pool.writer()).await.is_err());

        Ok(())
    }
}
