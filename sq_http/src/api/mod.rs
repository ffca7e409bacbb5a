use std::sync::Arc;
use aide::axum::IntoApiResponse;
use aide::axum::routing::{get, get_with};
use aide::openapi::OpenApi;
use aide::scalar::Scalar;
use aide::transform::{TransformOpenApi, TransformOperation};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sq_db::DbId;
use sq_system::features::{Feature, FeatureFlags};
use sq_system::SystemHandle;
use crate::api::error::{ApiError, ApiResponseError};
use crate::api::extractor::Json;

pub mod error;
pub mod extractor;
pub mod auth;
pub mod campaigns;
pub mod characters;
pub mod dm;
pub mod items;
pub mod meta;
pub mod story;
#[cfg(test)]
mod tests;

pub type ApiRouter<S = ()> = aide::axum::ApiRouter<S>;
pub type ApiResult<T, E = ApiError> = Result<T, E>;

#[derive(Clone)]
pub struct AppState {
    pub(crate) system: SystemHandle,
}

impl AppState {
    pub fn new(system: SystemHandle) -> Self {
        Self { system }
    }
}

/// Path of any route addressing a single resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct IdPath {
    pub id: DbId,
}

/// Plain acknowledgement for requests without a meaningful response body.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self { message: message.into() })
    }
}

/// Root config for all API routes.
///
/// Route groups are only registered when their [Feature] is enabled at the time of the call.
pub fn config(features: &FeatureFlags) -> Router<AppState> {
    aide::r#gen::on_error(|error| {
        tracing::error!(?error, "Aide Error");
    });

    aide::r#gen::extract_schemas(true);
    let mut api = OpenApi::default();

    let mut base_router = ApiRouter::new()
        .nest_api_service("/docs", docs_routes())
        .merge(auth::config())
        .merge(meta::features_config());

    let groups: [(Feature, fn() -> ApiRouter<AppState>); 5] = [
        (Feature::Campaigns, campaigns::config),
        (Feature::Characters, characters::config),
        (Feature::StoryPosts, story::config),
        (Feature::DmResponses, dm::config),
        (Feature::Items, items::config),
    ];
    for (feature, routes) in groups {
        if features.is_enabled(feature) {
            base_router = base_router.merge(routes());
        } else {
            tracing::info!(?feature, "Feature disabled, not registering its routes");
        }
    }
    if features.is_enabled(Feature::Items) && features.is_enabled(Feature::DmResponses) {
        base_router = base_router.merge(items::generate_config());
    }

    ApiRouter::new()
        .nest("/api", base_router)
        .merge(meta::health_config())
        .finish_api_with(&mut api, api_docs)
        .fallback(not_found)
        .layer(Extension(Arc::new(api)))
}

pub fn docs_routes() -> ApiRouter {
    aide::r#gen::infer_responses(true);

    let router: ApiRouter = ApiRouter::new()
        .api_route(
            "/",
            get_with(
                Scalar::new("/api/docs/api.json")
                    .with_title("StoryQuest")
                    .axum_handler(),
                |op: TransformOperation| op.description("This documentation page."),
            ),
        )
        .route("/api.json", get(serve_docs));

    aide::r#gen::infer_responses(false);

    router
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

async fn not_found() -> impl IntoResponse {
    ApiResponseError::new(StatusCode::NOT_FOUND, "Not Found")
}

fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("StoryQuest")
        .summary("A role playing game narrated by an AI Dungeon Master")
        .description(include_str!("../../../README.md"))
        .default_response_with::<Json<ApiResponseError<()>>, _>(|res| {
            res.example(ApiResponseError {
                code: 500,
                message: "Internal error".to_string(),
                details: None,
            })
        })
}
