use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::FlashcardRequest;
use super::repo_types::Flashcard;
use super::services;
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    pagination::{FlashcardPage, Page, PageQuery},
    state::AppState,
};

pub fn flashcard_routes() -> Router<AppState> {
    Router::new()
        .route("/flashcards", get(list_flashcards).post(create_flashcard))
        .route(
            "/flashcards/:id",
            get(get_flashcard)
                .put(update_flashcard)
                .delete(delete_flashcard),
        )
}

#[utoipa::path(
    get,
    path = "/flashcards",
    tag = "flashcards",
    security(("token" = [])),
    params(("page" = Option<i64>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "One page of the caller's flashcards", body = FlashcardPage),
        (status = 400, description = "Page is not an integer", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn list_flashcards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Flashcard>>> {
    let Query(query) = query?;
    Ok(Json(
        services::list(state.store.as_ref(), user_id, query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/flashcards",
    tag = "flashcards",
    security(("token" = [])),
    request_body = FlashcardRequest,
    responses(
        (status = 201, description = "Flashcard created for the caller", body = Flashcard),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<FlashcardRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Flashcard>)> {
    let Json(payload) = payload?;
    let card = services::create(state.store.as_ref(), user_id, payload.into_new()?).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

#[utoipa::path(
    get,
    path = "/flashcards/{id}",
    tag = "flashcards",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "Flashcard id")),
    responses(
        (status = 200, description = "The flashcard", body = Flashcard),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such flashcard owned by the caller", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn get_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Flashcard>> {
    let Path(id) = id?;
    Ok(Json(services::get(state.store.as_ref(), user_id, id).await?))
}

#[utoipa::path(
    put,
    path = "/flashcards/{id}",
    tag = "flashcards",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "Flashcard id")),
    request_body = FlashcardRequest,
    responses(
        (status = 200, description = "Updated flashcard", body = Flashcard),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such flashcard owned by the caller", body = ErrorBody),
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<FlashcardRequest>, JsonRejection>,
) -> ApiResult<Json<Flashcard>> {
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
    path = "/flashcards/{id}",
    tag = "flashcards",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "Flashcard id")),
    responses(
        (status = 204, description = "Flashcard deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such flashcard owned by the caller", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn delete_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    services::delete(state.store.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
