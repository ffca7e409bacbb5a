use aide::axum::routing::post_with;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use sq_system::dm::{DmExchange, PlayerAction};
use sq_system::StoryPost;
use crate::api::extractor::{AuthUser, Created, Json};
use crate::api::{ApiResult, ApiRouter, AppState, IdPath};

pub fn config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route(
            "/campaigns/:id/dm-response",
            post_with(respond, respond_docs).get_with(dm_posts, dm_posts_docs),
        )
        .api_route("/campaigns/:id/introduction", post_with(introduce, introduce_docs))
        .with_path_items(|t| t.tag("Dungeon Master").description("Story continuations narrated by the AI Dungeon Master"))
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id, character = action.character_id))]
pub async fn respond(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(action): Json<PlayerAction>,
) -> ApiResult<Created<DmExchange>> {
    Ok(Created(state.system.dm.respond(user.id(), path.id, action).await?))
}

fn respond_docs(op: TransformOperation) -> TransformOperation {
    op.description("Let a character act and have the Dungeon Master narrate what happens. \
    Both the player's post and the response are stored, or neither if the language model fails.")
        .response::<201, Json<DmExchange>>()
        .response_with::<502, Json<crate::api::error::ApiResponseError<String>>, _>(|res| {
            res.description("The language model could not be reached or returned an error")
        })
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn dm_posts(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<Vec<StoryPost>>> {
    Ok(Json(state.system.dm.dm_posts(user.id(), path.id).await?))
}

fn dm_posts_docs(op: TransformOperation) -> TransformOperation {
    op.description("Everything the Dungeon Master has narrated in this campaign, oldest first")
        .response::<200, Json<Vec<StoryPost>>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn introduce(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Created<StoryPost>> {
    Ok(Created(state.system.dm.introduce(user.id(), path.id).await?))
}

fn introduce_docs(op: TransformOperation) -> TransformOperation {
    op.description("Generate a fresh introduction for the campaign and add it to the story")
        .response::<201, Json<StoryPost>>()
}
