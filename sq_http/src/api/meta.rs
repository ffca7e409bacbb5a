use std::collections::BTreeMap;
use aide::axum::routing::get_with;
use aide::transform::TransformOperation;
use axum::extract::State;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sq_system::features::Feature;
use crate::api::extractor::Json;
use crate::api::{ApiResult, ApiRouter, AppState};

pub fn features_config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/features", get_with(get_features, get_features_docs))
        .with_path_items(|t| t.tag("Meta"))
}

pub fn health_config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/health", get_with(health, health_docs))
        .with_path_items(|t| t.tag("Meta"))
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

pub async fn get_features(state: State<AppState>) -> ApiResult<Json<BTreeMap<Feature, bool>>> {
    Ok(Json(state.system.features.all_flags()))
}

fn get_features_docs(op: TransformOperation) -> TransformOperation {
    op.description("The state of every feature flag. Routes of disabled features are not available.")
        .response::<200, Json<BTreeMap<Feature, bool>>>()
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
    })
}

fn health_docs(op: TransformOperation) -> TransformOperation {
    op.description("Liveness check")
        .response::<200, Json<HealthResponse>>()
}
