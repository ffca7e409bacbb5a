use aide::axum::routing::get_with;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use sq_system::characters::{CharacterUpdate, NewCharacter};
use sq_system::{Character, CharacterDetail};
use crate::api::extractor::{AuthUser, Created, Json};
use crate::api::{ApiResult, ApiRouter, AppState, IdPath, MessageResponse};

pub fn config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/characters", get_with(list_characters, list_characters_docs).post_with(create_character, create_character_docs))
        .api_route(
            "/characters/:id",
            get_with(get_character, get_character_docs)
                .put_with(update_character, update_character_docs)
                .delete_with(delete_character, delete_character_docs),
        )
        .api_route("/campaigns/:id/characters", get_with(campaign_characters, campaign_characters_docs))
        .with_path_items(|t| t.tag("Characters").description("Player characters taking part in campaigns"))
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn list_characters(state: State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<Character>>> {
    Ok(Json(state.system.characters.list_for_user(user.id()).await?))
}

fn list_characters_docs(op: TransformOperation) -> TransformOperation {
    op.description("All characters across the campaigns of the current user, newest first")
        .response::<200, Json<Vec<Character>>>()
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn create_character(state: State<AppState>, user: AuthUser, Json(new): Json<NewCharacter>) -> ApiResult<Created<Character>> {
    Ok(Created(state.system.characters.create(user.id(), new).await?))
}

fn create_character_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create a character in one of the user's campaigns. Attributes default to 10 and must lie within 1 to 30.")
        .response::<201, Json<Character>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), character = path.id))]
pub async fn get_character(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<CharacterDetail>> {
    Ok(Json(state.system.characters.get(user.id(), path.id).await?))
}

fn get_character_docs(op: TransformOperation) -> TransformOperation {
    op.description("A character with its campaign and inventory")
        .response::<200, Json<CharacterDetail>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), character = path.id))]
pub async fn update_character(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(update): Json<CharacterUpdate>,
) -> ApiResult<Json<Character>> {
    Ok(Json(state.system.characters.update(user.id(), path.id, update).await?))
}

fn update_character_docs(op: TransformOperation) -> TransformOperation {
    op.description("Partially update a character")
        .response::<200, Json<Character>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), character = path.id))]
pub async fn delete_character(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<MessageResponse>> {
    state.system.characters.delete(user.id(), path.id).await?;

    Ok(MessageResponse::new("Character removed"))
}

fn delete_character_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete a character, its story posts are kept without an author")
        .response::<200, Json<MessageResponse>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn campaign_characters(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<Vec<CharacterDetail>>> {
    Ok(Json(state.system.characters.list_for_campaign(user.id(), path.id).await?))
}

fn campaign_characters_docs(op: TransformOperation) -> TransformOperation {
    op.description("All characters of a campaign, each with their inventory")
        .response::<200, Json<Vec<CharacterDetail>>>()
}
