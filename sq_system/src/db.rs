use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use eyre::{Context, ContextCompat};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;
use sq_db::DatabasePool;

pub type StoryDb = DatabasePool;

#[derive(Clone, Debug, Hash, PartialOrd, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Full path to the DB file.
    pub db_path: PathBuf,
    pub in_memory: bool,
    /// The amount of connections to the database.
    pub max_connections_reader: NonZeroU32,
    /// SQLite only allows one writer, more connections just end up waiting on `database is locked`.
    pub max_connections_writer: NonZeroU32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_path: crate::get_app_dirs().data_dir.join("storyquest.db"),
            in_memory: false,
            max_connections_reader: NonZeroU32::new(8).unwrap_or(NonZeroU32::MIN),
            max_connections_writer: NonZeroU32::MIN,
        }
    }
}

impl DbConfig {
    /// A fresh private database, used by tests and one-off tooling.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Default::default()
        }
    }

    /// Turn the config settings into a valid DB url.
    pub fn database_url(&self) -> eyre::Result<String> {
        if self.in_memory {
            Ok("sqlite::memory:".to_string())
        } else {
            let path = self.db_path
                .to_str()
                .context("Invalid database path specified in config or ENV")?;
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
    }
}

/// Open the database described by `db_cfg` and bring its schema up to date.
pub async fn initialise_database(db_cfg: DbConfig) -> eyre::Result<StoryDb> {
    let options = db_cfg
        .database_url()?
        .parse::<SqliteConnectOptions>()?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(10));

    let pool = if db_cfg.in_memory {
        DatabasePool::new_sqlite_shared(options).await?
    } else {
        if let Some(parent) = db_cfg.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal) // Since we're in WAL mode
            .pragma("wal_autocheckpoint", "1000");

        DatabasePool::new_sqlite(
            options,
            db_cfg.max_connections_writer.get(),
            db_cfg.max_connections_reader.get(),
        )
        .await?
    };

    setup_db_schema(pool.get_sqlx_sqlite_writer()).await?;

    Ok(pool)
}

async fn setup_db_schema(db: &SqlitePool) -> eyre::Result<()> {
    tracing::info!("Running database migrations");

    sq_db::migrate()
        .run(db)
        .await
        .context("Error running database migrations")?;

    tracing::info!("Completed database setup");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_uses_create_mode() -> eyre::Result<()> {
        let cfg = DbConfig {
            db_path: PathBuf::from("/tmp/story.db"),
            ..Default::default()
        };
        assert_eq!(cfg.database_url()?, "sqlite:///tmp/story.db?mode=rwc");
        assert_eq!(DbConfig::in_memory().database_url()?, "sqlite::memory:");
        Ok(())
    }
}
