use chrono::Utc;
use schemars::JsonSchema;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use sq_db::entity::{characters, sea_orm_active_enums as db_enums, story_posts};
use sq_db::{DbId, ReadConnection};
use crate::access::owned_campaign;
use crate::data::{AuthorType, StoryPost};
use crate::db::StoryDb;
use crate::error::{Result, SystemError};
use crate::validate;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewStoryPost {
    pub content: String,
    /// Defaults to a player post.
    #[serde(default)]
    pub author_type: Option<AuthorType>,
    /// The character making this post, has to be part of the campaign.
    #[serde(default)]
    pub character_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StoryPostUpdate {
    pub content: Option<String>,
    pub is_resolved: Option<bool>,
}

pub struct StoryService {
    db: StoryDb,
}

impl StoryService {
    pub fn new(db: StoryDb) -> Self {
        Self { db }
    }

    /// All posts of the campaign in the order they were written.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user: DbId, campaign_id: DbId) -> Result<Vec<StoryPost>> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;

        posts_for_campaign(self.db.reader(), campaign.id).await
    }

    #[tracing::instrument(skip(self, post), fields(author = ?post.author_type))]
    pub async fn create(&self, user: DbId, campaign_id: DbId, post: NewStoryPost) -> Result<StoryPost> {
        validate::not_empty("Content", &post.content)?;
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        if let Some(character_id) = post.character_id {
            character_in_campaign(self.db.reader(), campaign.id, character_id).await?;
        }

        let author = post.author_type.unwrap_or(AuthorType::Player);
        let created = new_post(campaign.id, post.character_id, post.content, author.into(), false)
            .insert(self.db.writer())
            .await?;

        Ok(created.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: DbId, campaign_id: DbId, post_id: DbId) -> Result<StoryPost> {
        Ok(self.owned_post(user, campaign_id, post_id).await?.into())
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, user: DbId, campaign_id: DbId, post_id: DbId, update: StoryPostUpdate) -> Result<StoryPost> {
        let post = self.owned_post(user, campaign_id, post_id).await?;
        let mut active: story_posts::ActiveModel = post.into();

        if let Some(content) = update.content {
            validate::not_empty("Content", &content)?;
            active.content = Set(content);
        }
        if let Some(resolved) = update.is_resolved {
            active.is_resolved = Set(resolved);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.writer()).await?.into())
    }

    /// Delete a player's post, posts by the Dungeon Master are permanent.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user: DbId, campaign_id: DbId, post_id: DbId) -> Result<()> {
        let post = self.owned_post(user, campaign_id, post_id).await?;
        if post.author_type != db_enums::AuthorType::Player {
            return Err(SystemError::forbidden("Only player posts can be deleted"));
        }

        post.delete(self.db.writer()).await?;

        Ok(())
    }

    /// The newest `limit` posts, returned oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn recent(&self, user: DbId, campaign_id: DbId, limit: u64) -> Result<Vec<StoryPost>> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;

        recent_posts(self.db.reader(), campaign.id, limit).await
    }

    async fn owned_post(&self, user: DbId, campaign_id: DbId, post_id: DbId) -> Result<story_posts::Model> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;

        story_posts::Entity::find_by_id(post_id)
            .filter(story_posts::Column::CampaignId.eq(campaign.id))
            .one(self.db.reader())
            .await?
            .ok_or_else(|| SystemError::not_found("Story post not found"))
    }
}

/// All posts of a campaign, oldest first with ties broken by insertion order.
pub(crate) async fn posts_for_campaign(conn: &impl ReadConnection, campaign_id: DbId) -> Result<Vec<StoryPost>> {
    let posts = story_posts::Entity::find()
        .filter(story_posts::Column::CampaignId.eq(campaign_id))
        .order_by_asc(story_posts::Column::CreatedAt)
        .order_by_asc(story_posts::Column::Id)
        .all(conn)
        .await?;

    Ok(posts.into_iter().map(StoryPost::from).collect())
}

/// The newest `limit` posts of a campaign, oldest first.
pub(crate) async fn recent_posts(conn: &impl ReadConnection, campaign_id: DbId, limit: u64) -> Result<Vec<StoryPost>> {
    let mut posts = story_posts::Entity::find()
        .filter(story_posts::Column::CampaignId.eq(campaign_id))
        .order_by_desc(story_posts::Column::CreatedAt)
        .order_by_desc(story_posts::Column::Id)
        .limit(limit)
        .all(conn)
        .await?;
    posts.reverse();

    Ok(posts.into_iter().map(StoryPost::from).collect())
}

pub(crate) async fn character_in_campaign(
    conn: &impl ReadConnection,
    campaign_id: DbId,
    character_id: DbId,
) -> Result<characters::Model> {
    characters::Entity::find_by_id(character_id)
        .filter(characters::Column::CampaignId.eq(campaign_id))
        .one(conn)
        .await?
        .ok_or_else(|| SystemError::not_found("Character not found in this campaign"))
}

pub(crate) fn new_post(
    campaign_id: DbId,
    character_id: Option<DbId>,
    content: String,
    author_type: db_enums::AuthorType,
    is_resolved: bool,
) -> story_posts::ActiveModel {
    let now = Utc::now();
    story_posts::ActiveModel {
        campaign_id: Set(campaign_id),
        character_id: Set(character_id),
        content: Set(content),
        author_type: Set(author_type),
        is_resolved: Set(is_resolved),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_system, Fixture};

    fn player_post(content: &str) -> NewStoryPost {
        NewStoryPost {
            content: content.into(),
            author_type: None,
            character_id: None,
        }
    }

    #[tokio::test]
    async fn posts_are_listed_in_writing_order() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;

        let first = system.story.create(fx.user, fx.campaign, player_post("First")).await?;
        let second = system.story.create(fx.user, fx.campaign, player_post("Second")).await?;

        let posts = system.story.list(fx.user, fx.campaign).await?;
        // The campaign introduction comes first
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].author_type, AuthorType::System);
        assert_eq!(posts[1].id, first.id);
        assert_eq!(posts[2].id, second.id);

        let recent = system.story.recent(fx.user, fx.campaign, 2).await?;
        assert_eq!(recent.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        Ok(())
    }

    #[tokio::test]
    async fn system_posts_cannot_be_deleted() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;

        let intro = system.story.list(fx.user, fx.campaign).await?.remove(0);
        let err = system.story.delete(fx.user, fx.campaign, intro.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Only player posts can be deleted");

        let post = system.story.create(fx.user, fx.campaign, player_post("Oops")).await?;
        system.story.delete(fx.user, fx.campaign, post.id).await?;
        assert!(matches!(
            system.story.get(fx.user, fx.campaign, post.id).await,
            Err(SystemError::NotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn create_validates_input() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;
        let other = Fixture::new_with_user(&system, "intruder").await?;

        assert!(matches!(
            system.story.create(fx.user, fx.campaign, player_post("   ")).await,
            Err(SystemError::Invalid { .. })
        ));

        let foreign_character = NewStoryPost {
            character_id: Some(other.character),
            ..player_post("Hello")
        };
        let err = system.story.create(fx.user, fx.campaign, foreign_character).await.unwrap_err();
        assert_eq!(err.to_string(), "Character not found in this campaign");

        assert!(matches!(
            system.story.list(other.user, fx.campaign).await,
            Err(SystemError::Forbidden { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn update_resolves_posts() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;
        let post = system.story.create(fx.user, fx.campaign, player_post("I wait")).await?;
        assert!(!post.is_resolved);

        let updated = system.story.update(fx.user, fx.campaign, post.id, StoryPostUpdate {
            is_resolved: Some(true),
            ..Default::default()
        }).await?;

        assert!(updated.is_resolved);
        assert_eq!(updated.content, "I wait");
        Ok(())
    }
}
