use aide::axum::routing::{get_with, post_with};
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sq_db::DbId;
use sq_system::items::{AssignItem, ItemUpdate, NewItem};
use sq_system::{InventoryItem, Item, ItemAssignment};
use crate::api::extractor::{AuthUser, Created, Json};
use crate::api::{ApiResult, ApiRouter, AppState, IdPath, MessageResponse};

pub fn config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/campaigns/:id/items", get_with(campaign_items, campaign_items_docs).post_with(create_item, create_item_docs))
        .api_route(
            "/items/:id",
            get_with(get_item, get_item_docs)
                .put_with(update_item, update_item_docs)
                .delete_with(delete_item, delete_item_docs),
        )
        .api_route(
            "/items/:id/characters/:character_id",
            post_with(assign_item, assign_item_docs)
                .put_with(equip_item, equip_item_docs)
                .delete_with(unassign_item, unassign_item_docs),
        )
        .api_route("/characters/:id/items", get_with(character_inventory, character_inventory_docs))
        .with_path_items(|t| t.tag("Items").description("Campaign items and the inventories of characters"))
}

/// Item generation relies on the Dungeon Master, and is therefore registered separately.
pub fn generate_config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/campaigns/:id/items/generate", post_with(generate_item, generate_item_docs))
        .with_path_items(|t| t.tag("Items"))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ItemCharacterPath {
    /// The item
    pub id: DbId,
    pub character_id: DbId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct EquipRequest {
    pub equipped: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct GenerateItemRequest {
    /// The character the item should suit, has to be part of the campaign.
    pub character_id: DbId,
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn campaign_items(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.system.items.list_for_campaign(user.id(), path.id).await?))
}

fn campaign_items_docs(op: TransformOperation) -> TransformOperation {
    op.description("All items of a campaign")
        .response::<200, Json<Vec<Item>>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn create_item(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(new): Json<NewItem>,
) -> ApiResult<Created<Item>> {
    Ok(Created(state.system.items.create(user.id(), path.id, new).await?))
}

fn create_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create an item in a campaign")
        .response::<201, Json<Item>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id, character = request.character_id))]
pub async fn generate_item(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(request): Json<GenerateItemRequest>,
) -> ApiResult<Created<Item>> {
    Ok(Created(state.system.dm.generate_item(user.id(), path.id, request.character_id).await?))
}

fn generate_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Have the Dungeon Master invent an item suited to the given character")
        .response::<201, Json<Item>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), item = path.id))]
pub async fn get_item(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<Item>> {
    Ok(Json(state.system.items.get(user.id(), path.id).await?))
}

fn get_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("A single item")
        .response::<200, Json<Item>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), item = path.id))]
pub async fn update_item(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(update): Json<ItemUpdate>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.system.items.update(user.id(), path.id, update).await?))
}

fn update_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Partially update an item, properties are replaced as a whole")
        .response::<200, Json<Item>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), item = path.id))]
pub async fn delete_item(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<MessageResponse>> {
    state.system.items.delete(user.id(), path.id).await?;

    Ok(MessageResponse::new("Item removed"))
}

fn delete_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete an item, removing it from every inventory")
        .response::<200, Json<MessageResponse>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), item = path.id, character = path.character_id))]
pub async fn assign_item(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<ItemCharacterPath>,
    Json(assign): Json<AssignItem>,
) -> ApiResult<Created<ItemAssignment>> {
    Ok(Created(state.system.items.assign(user.id(), path.id, path.character_id, assign).await?))
}

fn assign_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Give an item to a character of the same campaign")
        .response::<201, Json<ItemAssignment>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), item = path.id, character = path.character_id))]
pub async fn equip_item(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<ItemCharacterPath>,
    Json(request): Json<EquipRequest>,
) -> ApiResult<Json<ItemAssignment>> {
    Ok(Json(state.system.items.set_equipped(user.id(), path.id, path.character_id, request.equipped).await?))
}

fn equip_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Equip or unequip an item the character holds")
        .response::<200, Json<ItemAssignment>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), item = path.id, character = path.character_id))]
pub async fn unassign_item(state: State<AppState>, user: AuthUser, Path(path): Path<ItemCharacterPath>) -> ApiResult<Json<MessageResponse>> {
    state.system.items.unassign(user.id(), path.id, path.character_id).await?;

    Ok(MessageResponse::new("Item removed from character"))
}

fn unassign_item_docs(op: TransformOperation) -> TransformOperation {
    op.description("Take an item away from a character")
        .response::<200, Json<MessageResponse>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), character = path.id))]
pub async fn character_inventory(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.system.items.inventory(user.id(), path.id).await?))
}

fn character_inventory_docs(op: TransformOperation) -> TransformOperation {
    op.description("Everything a character holds")
        .response::<200, Json<Vec<InventoryItem>>>()
}
