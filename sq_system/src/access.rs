//! Ownership checks shared by all campaign-scoped services.

use sea_orm::EntityTrait;
use sq_db::entity::{campaigns, characters};
use sq_db::{DbId, ReadConnection};
use crate::error::{Result, SystemError};

/// Load a campaign, ensuring it belongs to `user`.
pub(crate) async fn owned_campaign(conn: &impl ReadConnection, user: DbId, campaign_id: DbId) -> Result<campaigns::Model> {
    let campaign = campaigns::Entity::find_by_id(campaign_id)
        .one(conn)
        .await?
        .ok_or_else(|| SystemError::not_found("Campaign not found"))?;

    if campaign.player_id != user {
        return Err(SystemError::forbidden("Not authorized to access this campaign"));
    }

    Ok(campaign)
}

/// Load a character together with its campaign, ensuring the campaign belongs to `user`.
pub(crate) async fn owned_character(
    conn: &impl ReadConnection,
    user: DbId,
    character_id: DbId,
) -> Result<(characters::Model, campaigns::Model)> {
    let (character, campaign) = characters::Entity::find_by_id(character_id)
        .find_also_related(campaigns::Entity)
        .one(conn)
        .await?
        .ok_or_else(|| SystemError::not_found("Character not found"))?;
    let campaign = campaign.ok_or_else(|| SystemError::not_found("Character not found"))?;

    if campaign.player_id != user {
        return Err(SystemError::forbidden("Not authorized to access this character"));
    }

    Ok((character, campaign))
}
