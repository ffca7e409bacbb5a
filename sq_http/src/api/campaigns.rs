use aide::axum::routing::get_with;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use sq_system::campaigns::{CampaignUpdate, NewCampaign};
use sq_system::{Campaign, CampaignDetail};
use crate::api::extractor::{AuthUser, Created, Json};
use crate::api::{ApiResult, ApiRouter, AppState, IdPath, MessageResponse};

pub fn config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/campaigns", get_with(list_campaigns, list_campaigns_docs).post_with(create_campaign, create_campaign_docs))
        .api_route(
            "/campaigns/:id",
            get_with(get_campaign, get_campaign_docs)
                .put_with(update_campaign, update_campaign_docs)
                .delete_with(delete_campaign, delete_campaign_docs),
        )
        .with_path_items(|t| t.tag("Campaigns").description("The adventures of the current user"))
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn list_campaigns(state: State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<Campaign>>> {
    Ok(Json(state.system.campaigns.list(user.id()).await?))
}

fn list_campaigns_docs(op: TransformOperation) -> TransformOperation {
    op.description("All campaigns of the current user, newest first")
        .response::<200, Json<Vec<Campaign>>>()
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn create_campaign(state: State<AppState>, user: AuthUser, Json(new): Json<NewCampaign>) -> ApiResult<Created<CampaignDetail>> {
    Ok(Created(state.system.campaigns.create(user.id(), new).await?))
}

fn create_campaign_docs(op: TransformOperation) -> TransformOperation {
    op.description("Start a new campaign. The Dungeon Master opens it with an introduction, which is part of the response.")
        .response::<201, Json<CampaignDetail>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn get_campaign(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<CampaignDetail>> {
    Ok(Json(state.system.campaigns.get(user.id(), path.id).await?))
}

fn get_campaign_docs(op: TransformOperation) -> TransformOperation {
    op.description("A campaign alongside its full story")
        .response::<200, Json<CampaignDetail>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn update_campaign(
    state: State<AppState>,
    user: AuthUser,
    Path(path): Path<IdPath>,
    Json(update): Json<CampaignUpdate>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.system.campaigns.update(user.id(), path.id, update).await?))
}

fn update_campaign_docs(op: TransformOperation) -> TransformOperation {
    op.description("Change the name, description or status of a campaign")
        .response::<200, Json<Campaign>>()
}

#[tracing::instrument(skip_all, fields(user = user.id(), campaign = path.id))]
pub async fn delete_campaign(state: State<AppState>, user: AuthUser, Path(path): Path<IdPath>) -> ApiResult<Json<MessageResponse>> {
    state.system.campaigns.delete(user.id(), path.id).await?;

    Ok(MessageResponse::new("Campaign removed"))
}

fn delete_campaign_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete a campaign together with its characters, story and items")
        .response::<200, Json<MessageResponse>>()
}
