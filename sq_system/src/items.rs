use chrono::Utc;
use schemars::JsonSchema;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use sq_db::entity::{character_items, items};
use sq_db::{DbId, ReadConnection};
use crate::access::{owned_campaign, owned_character};
use crate::data::{InventoryItem, Item, ItemAssignment, ItemType};
use crate::db::StoryDb;
use crate::error::{Result, SystemError};
use crate::story::character_in_campaign;
use crate::validate;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Arbitrary JSON object, defaults to `{}`.
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    /// Replaces the existing properties entirely.
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct AssignItem {
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub equipped: Option<bool>,
}

pub struct ItemService {
    db: StoryDb,
}

impl ItemService {
    pub fn new(db: StoryDb) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, user: DbId, campaign_id: DbId, new: NewItem) -> Result<Item> {
        let name = new.name.trim().to_string();
        validate::length("Name", &name, 1, 100)?;
        validate::not_empty("Description", &new.description)?;
        let properties = object_or_empty(new.properties)?;
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;

        let now = Utc::now();
        let item = items::ActiveModel {
            name: Set(name),
            description: Set(new.description),
            item_type: Set(new.item_type.into()),
            properties: Set(properties),
            campaign_id: Set(campaign.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.writer())
        .await?;

        Ok(item.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_for_campaign(&self, user: DbId, campaign_id: DbId) -> Result<Vec<Item>> {
        let campaign = owned_campaign(self.db.reader(), user, campaign_id).await?;
        let items = campaign
            .find_related(items::Entity)
            .order_by_asc(items::Column::CreatedAt)
            .order_by_asc(items::Column::Id)
            .all(self.db.reader())
            .await?;

        Ok(items.into_iter().map(Item::from).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: DbId, item_id: DbId) -> Result<Item> {
        Ok(self.owned_item(user, item_id).await?.into())
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, user: DbId, item_id: DbId, update: ItemUpdate) -> Result<Item> {
        let item = self.owned_item(user, item_id).await?;
        let mut active: items::ActiveModel = item.into();

        if let Some(name) = update.name.map(|n| n.trim().to_string()) {
            validate::length("Name", &name, 1, 100)?;
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            validate::not_empty("Description", &description)?;
            active.description = Set(description);
        }
        if let Some(item_type) = update.item_type {
            active.item_type = Set(item_type.into());
        }
        if let Some(properties) = update.properties {
            active.properties = Set(object_or_empty(Some(properties))?);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.writer()).await?.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user: DbId, item_id: DbId) -> Result<()> {
        let item = self.owned_item(user, item_id).await?;
        item.delete(self.db.writer()).await?;

        Ok(())
    }

    /// Give an item to a character of the same campaign.
    #[tracing::instrument(skip(self))]
    pub async fn assign(&self, user: DbId, item_id: DbId, character_id: DbId, assign: AssignItem) -> Result<ItemAssignment> {
        let quantity = assign.quantity.unwrap_or(1);
        validate::quantity(quantity)?;
        let item = self.owned_item(user, item_id).await?;
        let character = character_in_campaign(self.db.reader(), item.campaign_id, character_id).await?;

        if find_holding(self.db.reader(), item.id, character.id).await?.is_some() {
            return Err(already_held());
        }

        let now = Utc::now();
        let holding = character_items::ActiveModel {
            character_id: Set(character.id),
            item_id: Set(item.id),
            quantity: Set(quantity),
            equipped: Set(assign.equipped.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.writer())
        .await
        .map_err(|e| SystemError::from_unique_violation(e, already_held))?;

        Ok(holding.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn unassign(&self, user: DbId, item_id: DbId, character_id: DbId) -> Result<()> {
        let holding = self.owned_holding(user, item_id, character_id).await?;
        holding.delete(self.db.writer()).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_equipped(&self, user: DbId, item_id: DbId, character_id: DbId, equipped: bool) -> Result<ItemAssignment> {
        let holding = self.owned_holding(user, item_id, character_id).await?;
        let mut active: character_items::ActiveModel = holding.into();
        active.equipped = Set(equipped);
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.writer()).await?.into())
    }

    /// Everything the character holds.
    #[tracing::instrument(skip(self))]
    pub async fn inventory(&self, user: DbId, character_id: DbId) -> Result<Vec<InventoryItem>> {
        let (character, _) = owned_character(self.db.reader(), user, character_id).await?;

        inventory_of(self.db.reader(), character.id).await
    }

    async fn owned_item(&self, user: DbId, item_id: DbId) -> Result<items::Model> {
        let item = items::Entity::find_by_id(item_id)
            .one(self.db.reader())
            .await?
            .ok_or_else(|| SystemError::not_found("Item not found"))?;
        owned_campaign(self.db.reader(), user, item.campaign_id).await?;

        Ok(item)
    }

    async fn owned_holding(&self, user: DbId, item_id: DbId, character_id: DbId) -> Result<character_items::Model> {
        let item = self.owned_item(user, item_id).await?;

        find_holding(self.db.reader(), item.id, character_id)
            .await?
            .ok_or_else(|| SystemError::not_found("Character does not have this item"))
    }
}

fn already_held() -> SystemError {
    SystemError::conflict("Character already has this item")
}

fn object_or_empty(properties: Option<serde_json::Value>) -> Result<serde_json::Value> {
    match properties {
        None | Some(serde_json::Value::Null) => Ok(serde_json::json!({})),
        Some(value @ serde_json::Value::Object(_)) => Ok(value),
        Some(_) => Err(SystemError::invalid("Properties must be a JSON object")),
    }
}

async fn find_holding(conn: &impl ReadConnection, item_id: DbId, character_id: DbId) -> Result<Option<character_items::Model>> {
    Ok(character_items::Entity::find()
        .filter(character_items::Column::ItemId.eq(item_id))
        .filter(character_items::Column::CharacterId.eq(character_id))
        .one(conn)
        .await?)
}

/// The items held by a character, in the order they were received.
pub(crate) async fn inventory_of(conn: &impl ReadConnection, character_id: DbId) -> Result<Vec<InventoryItem>> {
    let holdings = character_items::Entity::find()
        .filter(character_items::Column::CharacterId.eq(character_id))
        .find_also_related(items::Entity)
        .order_by_asc(character_items::Column::Id)
        .all(conn)
        .await?;

    Ok(holdings
        .into_iter()
        .filter_map(|(holding, item)| item.map(|item| InventoryItem::new(holding, item)))
        .collect())
}
