use std::sync::Arc;
use chrono::Utc;
use schemars::JsonSchema;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use sq_db::entity::{campaigns, sea_orm_active_enums as db_enums};
use sq_db::DbId;
use crate::access::owned_campaign;
use crate::data::{Campaign, CampaignDetail, CampaignStatus};
use crate::db::StoryDb;
use crate::dm::DungeonMaster;
use crate::error::Result;
use crate::story::{new_post, posts_for_campaign};
use crate::validate;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewCampaign {
    pub name: String,
    pub description: String,
    /// Free-form, though `medieval-fantasy`, `sci-fi`, `post-apocalyptic`, `cyberpunk`, `steampunk` and `horror`
    /// get a tailored world description.
    pub theme: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
}

pub struct CampaignService {
    db: StoryDb,
    dm: Arc<DungeonMaster>,
}

impl CampaignService {
    pub fn new(db: StoryDb, dm: Arc<DungeonMaster>) -> Self {
        Self { db, dm }
    }

    /// The user's campaigns, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user: DbId) -> Result<Vec<Campaign>> {
        let campaigns = campaigns::Entity::find()
            .filter(campaigns::Column::PlayerId.eq(user))
            .order_by_desc(campaigns::Column::CreatedAt)
            .order_by_desc(campaigns::Column::Id)
            .all(self.db.reader())
            .await?;

        Ok(campaigns.into_iter().map(Campaign::from).collect())
    }

    /// Create a campaign and open it with an introduction from the Dungeon Master.
    ///
    /// A failing language model never fails the creation, a fixed introduction is used instead.
    #[tracing::instrument(skip(self, new), fields(theme = %new.theme))]
    pub async fn create(&self, user: DbId, new: NewCampaign) -> Result<CampaignDetail> {
        let name = new.name.trim().to_string();
        let theme = new.theme.trim().to_string();
        validate::length("Name", &name, 3, 100)?;
        validate::not_empty("Description", &new.description)?;
        validate::length("Theme", &theme, 3, 50)?;

        let intro = self.dm.campaign_intro(&name, &theme, &new.description).await;

        let now = Utc::now();
        let txn = self.db.writer().begin().await?;
        let campaign = campaigns::ActiveModel {
            name: Set(name),
            description: Set(new.description),
            player_id: Set(user),
            theme: Set(theme),
            status: Set(db_enums::CampaignStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        let intro = new_post(campaign.id, None, intro, db_enums::AuthorType::System, true)
            .insert(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(campaign = campaign.id, "Created campaign");

        Ok(CampaignDetail {
            campaign: campaign.into(),
            story_posts: vec![intro.into()],
        })
    }

    /// A campaign together with its full story.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: DbId, campaign_id: DbId) -> Result<CampaignDetail> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let story_posts = posts_for_campaign(self.db.reader(), campaign.id).await?;

        Ok(CampaignDetail {
            campaign: campaign.into(),
            story_posts,
        })
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, user: DbId, campaign_id: DbId, update: CampaignUpdate) -> Result<Campaign> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let mut active: campaigns::ActiveModel = campaign.into();

        if let Some(name) = update.name.map(|n| n.trim().to_string()) {
            validate::length("Name", &name, 3, 100)?;
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            validate::not_empty("Description", &description)?;
            active.description = Set(description);
        }
        if let Some(status) = update.status {
            active.status = Set(status.into());
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.writer()).await?.into())
    }

    /// Delete a campaign, along with all its characters, story posts and items.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user: DbId, campaign_id: DbId) -> Result<()> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        campaign.delete(self.db.writer()).await?;

        Ok(())
    }
}
