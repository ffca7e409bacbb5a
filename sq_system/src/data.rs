//! Public representations of the stored entities, as returned to API consumers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sq_db::entity::{campaigns, character_items, characters, items, sea_orm_active_enums as db_enums, story_posts, users};
use sq_db::DbId;

/// Mirror a database enum with an API-facing one, generating conversions in both directions.
macro_rules! mirror_db_enum {
    ($(#[$meta:meta])* $name:ident => $db:ty { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl From<$db> for $name {
            fn from(value: $db) -> Self {
                match value {
                    $(<$db>::$variant => Self::$variant),+
                }
            }
        }

        impl From<$name> for $db {
            fn from(value: $name) -> Self {
                match value {
                    $(<$name>::$variant => Self::$variant),+
                }
            }
        }
    };
}

mirror_db_enum!(
    Role => db_enums::UserRole { Player, Admin }
);
mirror_db_enum!(
    CampaignStatus => db_enums::CampaignStatus { Active, Completed, Paused }
);
mirror_db_enum!(
    /// Who wrote a story post: the player, or the system acting as Dungeon Master.
    AuthorType => db_enums::AuthorType { System, Player }
);
mirror_db_enum!(
    ItemType => db_enums::ItemType { Weapon, Armor, Potion, Artifact, Misc }
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PublicUser {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for PublicUser {
    fn from(value: users::Model) -> Self {
        Self {
            id: value.id,
            username: value.username,
            email: value.email,
            role: value.role.into(),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Campaign {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub player_id: DbId,
    pub theme: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<campaigns::Model> for Campaign {
    fn from(value: campaigns::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            player_id: value.player_id,
            theme: value.theme,
            status: value.status.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    /// The story so far, oldest post first.
    pub story_posts: Vec<StoryPost>,
}

/// The six classic attributes of a character.
///
/// Attributes left out default to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Stats {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl Stats {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 30;

    /// All attributes alongside their display name, in canonical order.
    pub fn named(&self) -> [(&'static str, i32); 6] {
        [
            ("Strength", self.strength),
            ("Dexterity", self.dexterity),
            ("Constitution", self.constitution),
            ("Intelligence", self.intelligence),
            ("Wisdom", self.wisdom),
            ("Charisma", self.charisma),
        ]
    }

    pub fn to_json(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(?e, "Stored character stats were malformed, using defaults");
            Stats::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Character {
    pub id: DbId,
    pub name: String,
    pub race: String,
    pub class: String,
    pub backstory: String,
    pub campaign_id: DbId,
    pub stats: Stats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<characters::Model> for Character {
    fn from(value: characters::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            race: value.race,
            class: value.class,
            backstory: value.backstory,
            campaign_id: value.campaign_id,
            stats: Stats::from_json(value.stats),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CharacterDetail {
    #[serde(flatten)]
    pub character: Character,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<Campaign>,
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoryPost {
    pub id: DbId,
    pub campaign_id: DbId,
    pub character_id: Option<DbId>,
    pub content: String,
    pub author_type: AuthorType,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<story_posts::Model> for StoryPost {
    fn from(value: story_posts::Model) -> Self {
        Self {
            id: value.id,
            campaign_id: value.campaign_id,
            character_id: value.character_id,
            content: value.content,
            author_type: value.author_type.into(),
            is_resolved: value.is_resolved,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Item {
    pub id: DbId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub properties: serde_json::Value,
    pub campaign_id: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<items::Model> for Item {
    fn from(value: items::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            item_type: value.item_type.into(),
            properties: value.properties,
            campaign_id: value.campaign_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// An item as held by a specific character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub item: Item,
    pub quantity: i32,
    pub equipped: bool,
}

impl InventoryItem {
    pub fn new(holding: character_items::Model, item: items::Model) -> Self {
        Self {
            item: item.into(),
            quantity: holding.quantity,
            equipped: holding.equipped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItemAssignment {
    pub item_id: DbId,
    pub character_id: DbId,
    pub quantity: i32,
    pub equipped: bool,
}

impl From<character_items::Model> for ItemAssignment {
    fn from(value: character_items::Model) -> Self {
        Self {
            item_id: value.item_id,
            character_id: value.character_id,
            quantity: value.quantity,
            equipped: value.equipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialise_like_the_database() {
        assert_eq!(serde_json::to_string(&AuthorType::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&CampaignStatus::Paused).unwrap(), "\"paused\"");
        assert_eq!(db_enums::ItemType::from(ItemType::Artifact), db_enums::ItemType::Artifact);
    }

    #[test]
    fn malformed_stats_fall_back_to_defaults() {
        let stats = Stats::from_json(serde_json::json!({ "strength": "very" }));
        assert_eq!(stats, Stats::default());

        let stats = Stats::from_json(Stats { strength: 18, ..Default::default() }.to_json());
        assert_eq!(stats.strength, 18);
        assert_eq!(stats.charisma, 10);
    }

    #[test]
    fn partial_stats_fill_in_defaults() -> eyre::Result<()> {
        let stats: Stats = serde_json::from_value(serde_json::json!({ "strength": 16 }))?;
        assert_eq!(stats, Stats { strength: 16, ..Default::default() });

        let schema = serde_json::to_value(schemars::schema_for!(Stats))?;
        assert!(schema.get("required").is_none());
        Ok(())
    }
}
