//! All domain logic of StoryQuest: accounts, campaigns and the AI Dungeon Master narrating them.

use std::path::PathBuf;
use std::sync::Arc;
use platform_dirs::AppDirs;
use crate::auth::AuthService;
use crate::campaigns::CampaignService;
use crate::characters::CharacterService;
use crate::config::SystemConfig;
use crate::db::StoryDb;
use crate::dm::DungeonMaster;
use crate::features::FeatureFlags;
use crate::items::ItemService;
use crate::llm::LlmBackend;
use crate::story::StoryService;

pub use crate::data::*;
pub use crate::error::{Result, SystemError};

pub mod access;
pub mod auth;
pub mod campaigns;
pub mod characters;
pub mod config;
pub mod data;
pub mod db;
pub mod dm;
pub mod error;
pub mod features;
pub mod items;
pub mod llm;
pub mod seed;
pub mod story;
pub mod validate;
#[cfg(test)]
pub(crate) mod test_util;

pub type SystemHandle = Arc<StoryQuestSystem>;

/// Single place collating all services of our system.
pub struct StoryQuestSystem {
    pub db: StoryDb,
    pub features: FeatureFlags,
    pub auth: AuthService,
    pub campaigns: CampaignService,
    pub characters: CharacterService,
    pub story: StoryService,
    pub items: ItemService,
    pub dm: Arc<DungeonMaster>,
}

impl StoryQuestSystem {
    pub fn new(config: &SystemConfig, db: StoryDb, llm: LlmBackend, features: FeatureFlags) -> Self {
        let dm = Arc::new(DungeonMaster::new(db.clone(), llm, config.dm, config.llm.intro_max_tokens));

        Self {
            auth: AuthService::new(db.clone(), &config.auth),
            campaigns: CampaignService::new(db.clone(), dm.clone()),
            characters: CharacterService::new(db.clone()),
            story: StoryService::new(db.clone()),
            items: ItemService::new(db.clone()),
            dm,
            features,
            db,
        }
    }

    /// Open the database and language model described by `config`.
    pub async fn from_config(config: &SystemConfig, features: FeatureFlags) -> eyre::Result<Self> {
        let llm = LlmBackend::from_config(&config.llm)?;
        let db = db::initialise_database(config.db.clone()).await?;

        Ok(Self::new(config, db, llm, features))
    }

    /// Shut the system down, closing all database connections.
    pub async fn shutdown(&self) -> eyre::Result<()> {
        self.db.close().await;
        Ok(())
    }
}

pub fn get_app_dirs() -> AppDirs {
    AppDirs::new(Some("StoryQuest"), false).unwrap_or_else(|| {
        tracing::warn!("Couldn't find a home directory, using the working directory instead");
        let base = PathBuf::from(".storyquest");
        AppDirs {
            cache_dir: base.join("cache"),
            config_dir: base.join("config"),
            data_dir: base.join("data"),
            state_dir: base.join("state"),
        }
    })
}
