use axum::{
    extract::{FromRef, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            FederatedLoginRequest, LoginRequest, MeResponse, RegisterRequest, TokenResponse,
            UpdateUsernameRequest, UpdateUsernameResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::AppResult,
    extract::ApiJson,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/google", post(federated_login))
        .route("/user/me", get(get_me))
        .route("/user/update", put(update_username))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let token = services::register(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(TokenResponse::new(token)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let token = services::login(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(TokenResponse::new(token)))
}

#[instrument(skip(state, payload))]
pub async fn federated_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FederatedLoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let token = services::federated_login(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(TokenResponse::new(token)))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = services::current_user(state.users.as_ref(), user_id).await?;
    Ok(Json(MeResponse {
        success: true,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_username(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateUsernameRequest>,
) -> AppResult<Json<UpdateUsernameResponse>> {
    let user = services::update_username(state.users.as_ref(), user_id, payload).await?;
    Ok(Json(UpdateUsernameResponse {
        success: true,
        updated_client: user.into(),
    }))
}
