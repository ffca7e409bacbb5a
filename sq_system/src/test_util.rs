use std::sync::Arc;
use sq_db::DbId;
use crate::auth::Registration;
use crate::campaigns::NewCampaign;
use crate::characters::NewCharacter;
use crate::config::SystemConfig;
use crate::data::Stats;
use crate::db::{initialise_database, DbConfig};
use crate::features::FeatureFlags;
use crate::llm::mock::MockLlm;
use crate::llm::LlmBackend;
use crate::{StoryQuestSystem, SystemHandle};

/// A system on a fresh in-memory database, backed by a mock language model.
pub async fn test_system() -> eyre::Result<(SystemHandle, Arc<MockLlm>)> {
    let config = SystemConfig {
        db: DbConfig::in_memory(),
        ..Default::default()
    };
    let db = initialise_database(config.db.clone()).await?;
    let mock = Arc::new(MockLlm::default());
    let system = StoryQuestSystem::new(&config, db, LlmBackend::Mock(mock.clone()), FeatureFlags::default());

    Ok((Arc::new(system), mock))
}

/// A registered user owning one campaign with a single character in it.
pub struct Fixture {
    pub user: DbId,
    pub campaign: DbId,
    pub character: DbId,
}

impl Fixture {
    pub async fn new(system: &SystemHandle) -> eyre::Result<Self> {
        Self::new_with_user(system, "player").await
    }

    pub async fn new_with_user(system: &SystemHandle, username: &str) -> eyre::Result<Self> {
        let user = Self::register(system, username).await?;
        let campaign = system
            .campaigns
            .create(user, NewCampaign {
                name: "The Sunken Keep".into(),
                description: "A fortress swallowed by the marsh".into(),
                theme: "medieval-fantasy".into(),
            })
            .await?
            .campaign;
        let character = system
            .characters
            .create(user, NewCharacter {
                campaign_id: campaign.id,
                name: "Thorin".into(),
                race: "Dwarf".into(),
                class: "Fighter".into(),
                backstory: Some("Exiled from the mountain halls".into()),
                stats: Some(Stats {
                    strength: 16,
                    ..Default::default()
                }),
            })
            .await?;

        Ok(Self {
            user,
            campaign: campaign.id,
            character: character.id,
        })
    }

    pub async fn register(system: &SystemHandle, username: &str) -> eyre::Result<DbId> {
        let response = system
            .auth
            .register(Registration {
                username: username.into(),
                email: format!("{username}@example.com"),
                password: "hunter22".into(),
            })
            .await?;

        Ok(response.user.id)
    }
}
