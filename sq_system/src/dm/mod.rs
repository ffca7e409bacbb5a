//! The AI Dungeon Master: context gathering, prompting and persisting what it narrates.

use chrono::Utc;
use schemars::JsonSchema;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use sq_db::entity::{items, sea_orm_active_enums as db_enums, story_posts};
use sq_db::DbId;
use crate::access::owned_campaign;
use crate::config::DmConfig;
use crate::data::{Character, Item, StoryPost};
use crate::db::StoryDb;
use crate::error::Result;
use crate::llm::{GenerationRequest, LlmBackend};
use crate::story::{character_in_campaign, new_post};
use crate::validate;

pub mod context;
pub mod prompt;
pub mod themes;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlayerAction {
    pub character_id: DbId,
    pub player_input: String,
}

/// The result of a single round of play.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DmExchange {
    pub player_post: StoryPost,
    pub dm_post: StoryPost,
}

pub struct DungeonMaster {
    db: StoryDb,
    llm: LlmBackend,
    config: DmConfig,
    intro_max_tokens: u32,
}

impl DungeonMaster {
    pub fn new(db: StoryDb, llm: LlmBackend, config: DmConfig, intro_max_tokens: u32) -> Self {
        Self {
            db,
            llm,
            config,
            intro_max_tokens,
        }
    }

    /// Narrate the consequences of the player's action.
    ///
    /// Both the player's post and the response are only stored once the response has been generated.
    #[tracing::instrument(skip(self, action), fields(character = action.character_id))]
    pub async fn respond(&self, user: DbId, campaign_id: DbId, action: PlayerAction) -> Result<DmExchange> {
        validate::not_empty("Player input", &action.player_input)?;
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let character = character_in_campaign(self.db.reader(), campaign.id, action.character_id).await?;

        let ctx = context::assemble(self.db.reader(), campaign, character, &self.config).await?;
        let request = GenerationRequest::with_system(prompt::dm_system_prompt(&ctx), action.player_input.clone());
        let generation = self.llm.generate(request).await?;

        self.store_exchange(user, ctx.campaign.id, ctx.character.id, action.player_input, generation.content)
            .await
    }

    /// Store a player post and the Dungeon Master's answer in one transaction.
    ///
    /// Campaign and character are checked again, they may have been removed while the answer was generated.
    async fn store_exchange(
        &self,
        user: DbId,
        campaign_id: DbId,
        character_id: DbId,
        player_input: String,
        response: String,
    ) -> Result<DmExchange> {
        let txn = self.db.writer().begin().await?;
        let campaign = owned_campaign(&txn, user, campaign_id).await?;
        let character = character_in_campaign(&txn, campaign.id, character_id).await?;

        let player_post = new_post(campaign.id, Some(character.id), player_input, db_enums::AuthorType::Player, true)
            .insert(&txn)
            .await?;
        let dm_post = new_post(campaign.id, Some(character.id), response, db_enums::AuthorType::System, false)
            .insert(&txn)
            .await?;
        txn.commit().await?;

        tracing::debug!(dm_post = dm_post.id, "Stored Dungeon Master response");

        Ok(DmExchange {
            player_post: player_post.into(),
            dm_post: dm_post.into(),
        })
    }

    /// Generate and store a fresh introduction for the campaign.
    #[tracing::instrument(skip(self))]
    pub async fn introduce(&self, user: DbId, campaign_id: DbId) -> Result<StoryPost> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let intro = self.generate_intro(&campaign.name, &campaign.theme, &campaign.description).await?;

        let post = new_post(campaign.id, None, intro, db_enums::AuthorType::System, true)
            .insert(self.db.writer())
            .await?;

        Ok(post.into())
    }

    /// Everything the Dungeon Master has narrated in this campaign, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn dm_posts(&self, user: DbId, campaign_id: DbId) -> Result<Vec<StoryPost>> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;

        let posts = story_posts::Entity::find()
            .filter(story_posts::Column::CampaignId.eq(campaign.id))
            .filter(story_posts::Column::AuthorType.eq(db_enums::AuthorType::System))
            .order_by_asc(story_posts::Column::CreatedAt)
            .order_by_asc(story_posts::Column::Id)
            .all(self.db.reader())
            .await?;

        Ok(posts.into_iter().map(StoryPost::from).collect())
    }

    /// Invent a new item suited to the character and store it in the campaign.
    #[tracing::instrument(skip(self))]
    pub async fn generate_item(&self, user: DbId, campaign_id: DbId, character_id: DbId) -> Result<Item> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let character = character_in_campaign(self.db.reader(), campaign.id, character_id).await?;

        let character = Character::from(character);
        let request = GenerationRequest::prompt(prompt::item_prompt(&campaign.theme, &character));
        let description = self.llm.generate(request).await?.content;
        let name = prompt::extract_item_name(&description);

        let now = Utc::now();
        let item = items::ActiveModel {
            name: Set(name),
            description: Set(description),
            item_type: Set(db_enums::ItemType::Misc),
            properties: Set(serde_json::json!({})),
            campaign_id: Set(campaign.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.writer())
        .await?;

        tracing::info!(item = item.id, name = %item.name, "Generated item");

        Ok(item.into())
    }

    /// An introduction for a campaign, falling back to a fixed text for the theme if generation fails.
    pub(crate) async fn campaign_intro(&self, name: &str, theme: &str, description: &str) -> String {
        match self.generate_intro(name, theme, description).await {
            Ok(intro) => intro,
            Err(e) => {
                tracing::warn!(?e, theme, "Failed to generate campaign introduction, using fallback");
                themes::fallback_intro(theme).to_string()
            }
        }
    }

    async fn generate_intro(&self, name: &str, theme: &str, description: &str) -> Result<String> {
        let request = GenerationRequest::prompt(prompt::campaign_intro_prompt(name, theme, description))
            .max_tokens(self.intro_max_tokens);

        Ok(self.llm.generate(request).await?.content)
    }
}
