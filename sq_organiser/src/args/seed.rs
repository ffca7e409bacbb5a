use sq_http::config::SharedConfig;
use sq_system::db::initialise_database;
use sq_system::seed::{seed, SEED_EMAIL, SEED_PASSWORD};

#[derive(clap::Args, Debug)]
pub struct SeedCommand {
    /// Delete all existing data before seeding.
    #[clap(short, long)]
    pub force: bool,
}

impl SeedCommand {
    #[tracing::instrument(skip_all, fields(force = self.force))]
    pub async fn run(self, config: SharedConfig) -> eyre::Result<()> {
        let db = initialise_database(config.db.clone()).await?;
        let result = seed(&db, self.force).await;
        db.close().await;

        let report = result?;
        tracing::info!(?report, "Seeded demo data, log in with {SEED_EMAIL} / {SEED_PASSWORD}");

        Ok(())
    }
}
