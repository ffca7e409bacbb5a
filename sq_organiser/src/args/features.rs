use sq_system::features::FeatureFlags;

#[derive(clap::Args, Debug)]
pub struct FeaturesCommand {}

impl FeaturesCommand {
    pub fn run(self) -> eyre::Result<()> {
        let flags = FeatureFlags::from_env().all_flags();

        println!("{}", serde_json::to_string_pretty(&flags)?);

        Ok(())
    }
}
