use crate::args::features::FeaturesCommand;
use crate::args::migrate::MigrateCommand;
use crate::args::seed::SeedCommand;

pub mod features;
pub mod migrate;
pub mod seed;

#[derive(clap::Parser, Debug)]
#[clap(version, about)]
pub struct ClapArgs {
    #[clap(subcommand)]
    pub commands: SubCommands,
}

#[derive(clap::Subcommand, Debug)]
pub enum SubCommands {
    /// Bring the database schema up to date
    #[clap(alias = "m")]
    Migrate(MigrateCommand),
    /// Fill the database with a demo account and campaign
    #[clap(alias = "s")]
    Seed(SeedCommand),
    /// Print the feature flags resolved from the current environment
    #[clap(alias = "f")]
    Features(FeaturesCommand),
}
