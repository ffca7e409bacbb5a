use sq_http::config::SharedConfig;
use sq_system::db::initialise_database;

#[derive(clap::Args, Debug)]
pub struct MigrateCommand {}

impl MigrateCommand {
    #[tracing::instrument(skip_all)]
    pub async fn run(self, config: SharedConfig) -> eyre::Result<()> {
        // Opening the database applies all pending migrations.
        let db = initialise_database(config.db.clone()).await?;
        db.close().await;

        tracing::info!(path = ?config.db.db_path, "Database is up to date");

        Ok(())
    }
}
