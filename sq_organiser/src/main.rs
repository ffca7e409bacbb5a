use std::sync::Arc;
use clap::Parser;
use tracing_subscriber::util::SubscriberInitExt;
use crate::args::SubCommands;

mod args;
mod trace;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _ = dotenv::dotenv();
    color_eyre::install()?;
    let args = args::ClapArgs::parse();
    let conf = Arc::new(sq_http::config::initialise_config()?);
    trace::create_subscriber("ERROR,sq_http=TRACE,sq_organiser=TRACE,sq_system=TRACE")?.init();

    let now = std::time::Instant::now();

    match args.commands {
        SubCommands::Migrate(migrate) => {
            migrate.run(conf).await?;
        }
        SubCommands::Seed(seed) => {
            seed.run(conf).await?;
        }
        SubCommands::Features(features) => {
            features.run()?;
        }
    }

    tracing::info!(
        "Runtime: {:.2?}", now.elapsed()
    );

    Ok(())
}
