use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, INVALID_CREDENTIALS},
        extractors::AuthUser,
        password::{hash_password, verify_password},
        repo_types::PublicUser,
        tokens,
    },
    error::{ApiError, ApiResult, ErrorBody},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(get_me))
        .route("/users/:id", get(get_user))
}

#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input or username taken", body = ErrorBody),
    )
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(payload) = payload?;
    let reg = payload.validate().map_err(|e| {
        warn!("invalid registration");
        e
    })?;

    let hash = hash_password(&reg.password)?;
    let user = state
        .store
        .create_user(&reg.username, &reg.email, &hash)
        .await?;
    let token = tokens::issue(state.store.as_ref(), user.id).await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token for the user", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
    )
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let (username, password) = payload.validate().map_err(|e| {
        warn!("login with incomplete credentials");
        e
    })?;

    let Some(user) = state.store.find_user_by_username(&username).await? else {
        warn!(username = %username, "login unknown username");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = tokens::issue(state.store.as_ref(), user.id).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("token" = [])),
    responses(
        (status = 200, description = "The authenticated user", body = PublicUser),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    Ok(Json(PublicUser::from(&user)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User details", body = PublicUser),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
#[instrument(skip(state, _auth))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Path(id) = id?;
    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(PublicUser::from(&user)))
}
