use aide::axum::routing::get_with;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use schemars::JsonSchema;
use serde::Deserialize;
use sq_db::DbId;
use sq_system::story::{NewStoryPost, StoryPostUpdate};
use sq_system::StoryPost;
use crate::api::extractor::{AuthUser, Created, Json, Query};
use crate::api::{ApiResult, ApiRouter, AppState, IdPath, MessageResponse};

pub fn config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/campaigns/:id/story", get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs))
        .api_route(
            "/campaigns/:id/story/:post_id",
            get_with(get_post, get_post_docs)
                .put_with(update_post, update_post_docs)
                .delete_with(delete_post, delete_post_docs),
        )
        .with_path_items(|t| t.tag("Story").description("The posts making up the story of a campaign"))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PostPath {
    /// The campaign
    pub id: DbId,
    pub post_id: DbId,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StoryQuery {
    /// Only return the newest `limit` posts.
    pub limit: Option<u64>,
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id, limit = query.limit))]
pub async fn list_posts(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Query(query): Query<StoryQuery>,
) -> ApiResult<Json<Vec<StoryPost>>> {
    let posts = match query.limit {
        Some(limit) => state.system.story.recent(user.id(), path.id, limit).await?,
        None => state.system.story.list(user.id(), path.id).await?,
    };

    Ok(Json(posts))
}

fn list_posts_docs(op: TransformOperation) -> TransformOperation {
    op.description("The story of a campaign, oldest post first. With `limit` only the newest posts are returned.")
        .response::<200, Json<Vec<StoryPost>>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn create_post(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(post): Json<NewStoryPost>,
) -> ApiResult<Created<StoryPost>> {
    Ok(Created(state.system.story.create(user.id(), path.id, post).await?))
}

fn create_post_docs(op: TransformOperation) -> TransformOperation {
    op.description("Add a post to the story without involving the Dungeon Master")
        .response::<201, Json<StoryPost>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id, post = path.post_id))]
pub async fn get_post(state: State<AppState>, user: AuthUser, Path(path): Path<PostPath>) -> ApiResult<Json<StoryPost>> {
    Ok(Json(state.system.story.get(user.id(), path.id, path.post_id).await?))
}

fn get_post_docs(op: TransformOperation) -> TransformOperation {
    op.description("A single story post")
        .response::<200, Json<StoryPost>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id, post = path.post_id))]
pub async fn update_post(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<PostPath>,
    Json(update): Json<StoryPostUpdate>,
) -> ApiResult<Json<StoryPost>> {
    Ok(Json(state.system.story.update(user.id(), path.id, path.post_id, update).await?))
}

fn update_post_docs(op: TransformOperation) -> TransformOperation {
    op.description("Edit the content of a post or mark it as resolved")
        .response::<200, Json<StoryPost>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id, post = path.post_id))]
pub async fn delete_post(state: State<AppState>, user: AuthUser, Path(path): Path<PostPath>) -> ApiResult<Json<MessageResponse>> {
    state.system.story.delete(user.id(), path.id, path.post_id).await?;

    Ok(MessageResponse::new("Story post removed"))
}

fn delete_post_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete a post written by the player. Posts of the Dungeon Master can not be deleted.")
        .response::<200, Json<MessageResponse>>()
}
