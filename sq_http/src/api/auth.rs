use aide::axum::routing::{get_with, post_with};
use aide::transform::TransformOperation;
use axum::extract::State;
use sq_system::auth::{AuthResponse, Credentials, ProfileUpdate, Registration};
use sq_system::PublicUser;
use crate::api::extractor::{AuthUser, Created, Json};
use crate::api::{ApiResult, ApiRouter, AppState};

pub fn config() -> ApiRouter<AppState> {
    ApiRouter::new()
        .nest(
            "/auth",
            ApiRouter::new()
                .api_route("/register", post_with(register, register_docs))
                .api_route("/login", post_with(login, login_docs))
                .api_route("/profile", get_with(get_profile, get_profile_docs).put_with(put_profile, put_profile_docs))
                .api_route("/users", get_with(list_users, list_users_docs)),
        )
        .with_path_items(|t| t.tag("Auth").description("Accounts and session tokens"))
}

#[tracing::instrument(skip_all)]
pub async fn register(state: State<AppState>, Json(registration): Json<Registration>) -> ApiResult<Created<AuthResponse>> {
    Ok(Created(state.system.auth.register(registration).await?))
}

fn register_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create a new account, returning the user alongside a session token")
        .response::<201, Json<AuthResponse>>()
}

#[tracing::instrument(skip_all)]
pub async fn login(state: State<AppState>, Json(credentials): Json<Credentials>) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(state.system.auth.login(credentials).await?))
}

fn login_docs(op: TransformOperation) -> TransformOperation {
    op.description("Exchange an email and password for a session token")
        .response::<200, Json<AuthResponse>>()
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn get_profile(state: State<AppState>, user: AuthUser) -> ApiResult<Json<PublicUser>> {
    Ok(Json(state.system.auth.profile(user.id()).await?))
}

fn get_profile_docs(op: TransformOperation) -> TransformOperation {
    op.description("The currently authenticated user")
        .response::<200, Json<PublicUser>>()
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn put_profile(state: State<AppState>, user: AuthUser, Json(update): Json<ProfileUpdate>) -> ApiResult<Json<PublicUser>> {
    Ok(Json(state.system.auth.update_profile(user.id(), update).await?))
}

fn put_profile_docs(op: TransformOperation) -> TransformOperation {
    op.description("Update the username, email or password of the current user. Omitted fields stay unchanged.")
        .response::<200, Json<PublicUser>>()
}

#[tracing::instrument(skip_all, fields(user = user.id()))]
pub async fn list_users(state: State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<PublicUser>>> {
    Ok(Json(state.system.auth.list_users(&user.0).await?))
}

fn list_users_docs(op: TransformOperation) -> TransformOperation {
    op.description("All registered users, requires an admin account")
        .response::<200, Json<Vec<PublicUser>>>()
}
