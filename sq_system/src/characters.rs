use chrono::Utc;
use schemars::JsonSchema;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use sq_db::entity::{campaigns, characters};
use sq_db::DbId;
use crate::access::{owned_campaign, owned_character};
use crate::data::{Character, CharacterDetail, Stats};
use crate::db::StoryDb;
use crate::error::Result;
use crate::items::inventory_of;
use crate::validate;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewCharacter {
    pub campaign_id: DbId,
    pub name: String,
    pub race: String,
    pub class: String,
    #[serde(default)]
    pub backstory: Option<String>,
    /// All attributes default to 10.
    #[serde(default)]
    pub stats: Option<Stats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub race: Option<String>,
    pub class: Option<String>,
    /// May be set to an empty string to clear it.
    pub backstory: Option<String>,
    pub stats: Option<Stats>,
}

pub struct CharacterService {
    db: StoryDb,
}

impl CharacterService {
    pub fn new(db: StoryDb) -> Self {
        Self { db }
    }

    /// Characters across all of the user's campaigns, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(&self, user: DbId) -> Result<Vec<Character>> {
        let characters = characters::Entity::find()
            .inner_join(campaigns::Entity)
            .filter(campaigns::Column::PlayerId.eq(user))
            .order_by_desc(characters::Column::CreatedAt)
            .order_by_desc(characters::Column::Id)
            .all(self.db.reader())
            .await?;

        Ok(characters.into_iter().map(Character::from).collect())
    }

    /// All characters of a campaign, each with their inventory.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_campaign(&self, user: DbId, campaign_id: DbId) -> Result<Vec<CharacterDetail>> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let characters = campaign
            .find_related(characters::Entity)
            .order_by_asc(characters::Column::CreatedAt)
            .order_by_asc(characters::Column::Id)
            .all(self.db.reader())
            .await?;

        let mut result = Vec::with_capacity(characters.len());
        for character in characters {
            let items = inventory_of(self.db.reader(), character.id).await?;
            result.push(CharacterDetail {
                character: character.into(),
                campaign: None,
                items,
            });
        }

        Ok(result)
    }

    #[tracing::instrument(skip(self, new), fields(campaign = new.campaign_id))]
    pub async fn create(&self, user: DbId, new: NewCharacter) -> Result<Character> {
        let name = new.name.trim().to_string();
        validate::length("Name", &name, 2, 100)?;
        validate::not_empty("Race", &new.race)?;
        validate::not_empty("Class", &new.class)?;
        let stats = new.stats.unwrap_or_default();
        validate::stats(&stats)?;

        let campaign = owned_campaign(self.db.reader(), user, new.campaign_id).await?;

        let now = Utc::now();
        let character = characters::ActiveModel {
            name: Set(name),
            race: Set(new.race.trim().to_string()),
            class: Set(new.class.trim().to_string()),
            backstory: Set(new.backstory.unwrap_or_default()),
            campaign_id: Set(campaign.id),
            stats: Set(stats.to_json()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.writer())
        .await?;

        tracing::info!(character = character.id, "Created character");

        Ok(character.into())
    }

    /// A character with its campaign and inventory.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: DbId, character_id: DbId) -> Result<CharacterDetail> {
        let (character, campaign) = owned_character(self.db.reader(), user, character_id).await?;
        let items = inventory_of(self.db.reader(), character.id).await?;

        Ok(CharacterDetail {
            character: character.into(),
            campaign: Some(campaign.into()),
            items,
        })
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, user: DbId, character_id: DbId, update: CharacterUpdate) -> Result<Character> {
        let (character, _) = owned_character(self.db.reader(), user, character_id).await?;
        let mut active: characters::ActiveModel = character.into();

        if let Some(name) = update.name.map(|n| n.trim().to_string()) {
            validate::length("Name", &name, 2, 100)?;
            active.name = Set(name);
        }
        if let Some(race) = update.race {
            validate::not_empty("Race", &race)?;
            active.race = Set(race.trim().to_string());
        }
        if let Some(class) = update.class {
            validate::not_empty("Class", &class)?;
            active.class = Set(class.trim().to_string());
        }
        if let Some(backstory) = update.backstory {
            active.backstory = Set(backstory);
        }
        if let Some(stats) = update.stats {
            validate::stats(&stats)?;
            active.stats = Set(stats.to_json());
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.writer()).await?.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user: DbId, character_id: DbId) -> Result<()> {
        let (character, _) = owned_character(self.db.reader(), user, character_id).await?;
        character.delete(self.db.writer()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SystemError;
    use crate::test_util::{test_system, Fixture};
    use super::*;

    fn new_character(campaign_id: DbId, name: &str) -> NewCharacter {
        NewCharacter {
            campaign_id,
            name: name.into(),
            race: "Human".into(),
            class: "Wizard".into(),
            backstory: None,
            stats: None,
        }
    }

    #[tokio::test]
    async fn defaults_and_validation() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;

        let created = system.characters.create(fx.user, new_character(fx.campaign, "Elminster")).await?;
        assert_eq!(created.stats, Stats::default());
        assert_eq!(created.backstory, "");

        let strong = NewCharacter {
            stats: Some(Stats { strength: 31, ..Default::default() }),
            ..new_character(fx.campaign, "Hulk")
        };
        assert!(matches!(system.characters.create(fx.user, strong).await, Err(SystemError::Invalid { .. })));
        assert!(matches!(
            system.characters.create(fx.user, new_character(fx.campaign, "X")).await,
            Err(SystemError::Invalid { .. })
        ));
        assert!(matches!(
            system.characters.create(fx.user, new_character(4242, "Nobody")).await,
            Err(SystemError::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn foreign_campaigns_and_characters_are_forbidden() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;
        let intruder = Fixture::register(&system, "intruder").await?;

        assert!(matches!(
            system.characters.create(intruder, new_character(fx.campaign, "Spy")).await,
            Err(SystemError::Forbidden { .. })
        ));
        assert!(matches!(system.characters.get(intruder, fx.character).await, Err(SystemError::Forbidden { .. })));
        assert!(matches!(system.characters.get(fx.user, 777).await, Err(SystemError::NotFound { .. })));
        assert!(system.characters.list_for_user(intruder).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn listing_and_detail() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;
        let second = system.characters.create(fx.user, new_character(fx.campaign, "Elminster")).await?;

        let all = system.characters.list_for_user(fx.user).await?;
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id, fx.character]);

        let in_campaign = system.characters.list_for_campaign(fx.user, fx.campaign).await?;
        assert_eq!(in_campaign.len(), 2);
        assert!(in_campaign.iter().all(|c| c.items.is_empty()));

        let detail = system.characters.get(fx.user, fx.character).await?;
        assert_eq!(detail.campaign.map(|c| c.id), Some(fx.campaign));
        Ok(())
    }

    #[tokio::test]
    async fn partial_update_can_clear_backstory() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;

        let updated = system.characters.update(fx.user, fx.character, CharacterUpdate {
            backstory: Some(String::new()),
            stats: Some(Stats { wisdom: 18, ..Default::default() }),
            ..Default::default()
        }).await?;

        assert_eq!(updated.backstory, "");
        assert_eq!(updated.stats.wisdom, 18);
        assert_eq!(updated.name, "Thorin");

        system.characters.delete(fx.user, fx.character).await?;
        assert!(matches!(system.characters.get(fx.user, fx.character).await, Err(SystemError::NotFound { .. })));
        Ok(())
    }
}
