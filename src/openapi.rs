use axum::Json;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::auth::repo_types::PublicUser;
use crate::error::ErrorBody;
use crate::flashcards::dto::FlashcardRequest;
use crate::flashcards::repo_types::Flashcard;
use crate::groups::dto::{GroupRequest, JoinResponse};
use crate::groups::repo_types::StudyGroup;
use crate::pagination::{FlashcardPage, GroupPage};
use crate::{app, auth, flashcards, groups};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "studygroup",
        description = "Accounts, study groups and personal flashcards."
    ),
    paths(
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        auth::handlers::get_user,
        groups::handlers::list_groups,
        groups::handlers::create_group,
        groups::handlers::get_group,
        groups::handlers::update_group,
        groups::handlers::delete_group,
        groups::handlers::join_group,
        flashcards::handlers::list_flashcards,
        flashcards::handlers::create_flashcard,
        flashcards::handlers::get_flashcard,
        flashcards::handlers::update_flashcard,
        flashcards::handlers::delete_flashcard,
        app::health,
    ),
    components(schemas(
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        LoginResponse,
        PublicUser,
        GroupRequest,
        StudyGroup,
        GroupPage,
        JoinResponse,
        FlashcardRequest,
        Flashcard,
        FlashcardPage,
        ErrorBody,
        app::HealthStatus,
    )),
    modifiers(&TokenAuth),
    tags(
        (name = "users", description = "Registration, login and user lookup"),
        (name = "groups", description = "Study groups and membership"),
        (name = "flashcards", description = "Flashcards owned by the caller"),
        (name = "ops", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Declares the `token` scheme the authenticated operations refer to.
struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` or `Bearer <key>`",
            ))),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
