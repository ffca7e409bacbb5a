//! Demo data for local development.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set, TransactionTrait};
use serde_json::json;
use sq_db::entity::{campaigns, character_items, characters, items, sea_orm_active_enums as db_enums, story_posts, users};
use sq_db::{DbId, WriteConnection};
use crate::auth::hash_password;
use crate::data::Stats;
use crate::db::StoryDb;
use crate::error::{Result, SystemError};
use crate::story::new_post;

pub const SEED_USERNAME: &str = "testuser";
pub const SEED_EMAIL: &str = "test@example.com";
pub const SEED_PASSWORD: &str = "password123";

/// Ids of everything created by [seed].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub user: DbId,
    pub campaign: DbId,
    pub character: DbId,
    pub item: DbId,
}

/// Fill the database with a demo account and a small campaign.
///
/// Refuses to touch a database which already has users, unless `force` is set in which case all existing rows are removed first.
#[tracing::instrument(skip(db))]
pub async fn seed(db: &StoryDb, force: bool) -> Result<SeedReport> {
    let existing = users::Entity::find().count(db.reader()).await?;
    if existing > 0 && !force {
        return Err(SystemError::conflict(format!(
            "Database already contains {existing} users, pass `force` to wipe it first"
        )));
    }

    let password_hash = hash_password(SEED_PASSWORD.to_string()).await?;

    let txn = db.writer().begin().await?;
    if force {
        clear_all(&txn).await?;
    }
    let report = insert_demo(&txn, password_hash).await?;
    txn.commit().await?;

    tracing::info!(?report, "Seeded database");

    Ok(report)
}

async fn clear_all(conn: &impl WriteConnection) -> Result<()> {
    character_items::Entity::delete_many().exec(conn).await?;
    items::Entity::delete_many().exec(conn).await?;
    story_posts::Entity::delete_many().exec(conn).await?;
    characters::Entity::delete_many().exec(conn).await?;
    campaigns::Entity::delete_many().exec(conn).await?;
    let removed = users::Entity::delete_many().exec(conn).await?;

    tracing::debug!(users = removed.rows_affected, "Cleared existing data");

    Ok(())
}

async fn insert_demo(conn: &impl WriteConnection, password_hash: String) -> Result<SeedReport> {
    let now = Utc::now();

    let user = users::ActiveModel {
        username: Set(SEED_USERNAME.into()),
        email: Set(SEED_EMAIL.into()),
        password_hash: Set(password_hash),
        role: Set(db_enums::UserRole::Player),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let campaign = campaigns::ActiveModel {
        name: Set("The Lost Mines of Phandelver".into()),
        description: Set("A classic adventure of dwarven mines, goblin ambushes and a long lost forge of spells.".into()),
        player_id: Set(user.id),
        theme: Set("Fantasy".into()),
        status: Set(db_enums::CampaignStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let stats = Stats {
        strength: 16,
        dexterity: 12,
        constitution: 14,
        intelligence: 10,
        wisdom: 12,
        charisma: 8,
    };
    let character = characters::ActiveModel {
        name: Set("Thorin Oakenshield".into()),
        race: Set("Dwarf".into()),
        class: Set("Fighter".into()),
        backstory: Set("A proud warrior searching for the mine his ancestors lost to the goblins.".into()),
        campaign_id: Set(campaign.id),
        stats: Set(stats.to_json()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    new_post(
        campaign.id,
        None,
        "You are escorting a wagon of supplies along the Triboar Trail towards Phandalin. \
         Two dead horses block the road ahead, black-feathered arrows jutting from their flanks. What do you do?"
            .into(),
        db_enums::AuthorType::System,
        true,
    )
    .insert(conn)
    .await?;
    new_post(
        campaign.id,
        Some(character.id),
        "I draw my warhammer and carefully approach the horses, watching the treeline for movement.".into(),
        db_enums::AuthorType::Player,
        false,
    )
    .insert(conn)
    .await?;

    let item = items::ActiveModel {
        name: Set("Dwarven Warhammer".into()),
        description: Set("A heavy warhammer forged in the mountain halls, its head etched with ancestral runes.".into()),
        item_type: Set(db_enums::ItemType::Weapon),
        properties: Set(json!({ "damage": "1d10", "weight": 10, "value": 25 })),
        campaign_id: Set(campaign.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    character_items::ActiveModel {
        character_id: Set(character.id),
        item_id: Set(item.id),
        quantity: Set(1),
        equipped: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(SeedReport {
        user: user.id,
        campaign: campaign.id,
        character: character.id,
        item: item.id,
    })
}

#[cfg(test)]
mod tests {
    use crate::auth::Credentials;
    use crate::test_util::{test_system, Fixture};
    use super::*;

    #[tokio::test]
    async fn seeded_account_can_play() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let report = seed(&system.db, false).await?;

        let login = system.auth.login(Credentials {
            email: SEED_EMAIL.into(),
            password: SEED_PASSWORD.into(),
        }).await?;
        assert_eq!(login.user.id, report.user);

        let detail = system.campaigns.get(report.user, report.campaign).await?;
        assert_eq!(detail.story_posts.len(), 2);

        let inventory = system.items.inventory(report.user, report.character).await?;
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].item.name, "Dwarven Warhammer");
        assert!(inventory[0].equipped);
        Ok(())
    }

    #[tokio::test]
    async fn refuses_populated_database_without_force() -> eyre::Result<()> {
        let (system, _) = test_system().await?;
        let fx = Fixture::new(&system).await?;

        assert!(matches!(seed(&system.db, false).await, Err(SystemError::Conflict { .. })));

        seed(&system.db, true).await?;
        assert_eq!(users::Entity::find().count(system.db.reader()).await?, 1);
        assert!(matches!(
            system.campaigns.get(fx.user, fx.campaign).await,
            Err(SystemError::NotFound { .. })
        ));
        Ok(())
    }
}
