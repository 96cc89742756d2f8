use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GroupRequest, JoinResponse};
use super::repo_types::StudyGroup;
use super::services;
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    pagination::{GroupPage, Page, PageQuery},
    state::AppState,
};

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/:id/join", post(join_group))
}

#[utoipa::path(
    get,
    path = "/groups",
    tag = "groups",
    params(("page" = Option<i64>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "One page of groups", body = GroupPage),
        (status = 400, description = "Page is not an integer", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<StudyGroup>>> {
    let Query(query) = query?;
    Ok(Json(services::list(state.store.as_ref(), query).await?))
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "groups",
    security(("token" = [])),
    request_body = GroupRequest,
    responses(
        (status = 201, description = "Group created with the caller as creator and first member", body = StudyGroup),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<GroupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudyGroup>)> {
    let Json(payload) = payload?;
    let group = services::create(state.store.as_ref(), user_id, payload.into_new()?).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "groups",
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 200, description = "The group", body = StudyGroup),
        (status = 404, description = "Group not found", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<StudyGroup>> {
    let Path(id) = id?;
    Ok(Json(services::get(state.store.as_ref(), id).await?))
}

#[utoipa::path(
    put,
    path = "/groups/{id}",
    tag = "groups",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "Group id")),
    request_body = GroupRequest,
    responses(
        (status = 200, description = "Updated group", body = StudyGroup),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not the creator", body = ErrorBody),
        (status = 404, description = "Group not found", body = ErrorBody),
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<GroupRequest>, JsonRejection>,
) -> ApiResult<Json<StudyGroup>> {
    let Path(id) = id?;
    let changes = payload
        .map_err(ApiError::from)
        .and_then(|Json(req)| req.into_changes());
    Ok(Json(
        services::update(state.store.as_ref(), user_id, id, changes).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "groups",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not the creator", body = ErrorBody),
        (status = 404, description = "Group not found", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    services::delete(state.store.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/groups/{id}/join",
    tag = "groups",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 200, description = "Caller is a member", body = JoinResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Group not found", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn join_group(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<JoinResponse>> {
    let Path(id) = id?;
    services::join(state.store.as_ref(), user_id, id).await?;
    Ok(Json(JoinResponse {
        message: "Joined group successfully",
    }))
}
