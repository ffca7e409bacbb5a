use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "characters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub race: String,
    pub class: String,
    pub backstory: String,
    pub campaign_id: i32,
    /// Attribute block, stored as a JSON object with the six classic stats.
    #[sea_orm(column_type = "Json")]
    pub stats: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaigns::Entity",
        from = "Column::CampaignId",
        to = "super::campaigns::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Campaigns,
    #[sea_orm(has_many = "super::character_items::Entity")]
    CharacterItems,
    #[sea_orm(has_many = "super::story_posts::Entity")]
    StoryPosts,
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl Related<super::character_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CharacterItems.def()
    }
}

impl Related<super::story_posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoryPosts.def()
    }
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        super::character_items::Relation::Items.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::character_items::Relation::Characters.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
