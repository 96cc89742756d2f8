use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::{auth, flashcards, groups, openapi};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(groups::router())
        .merge(flashcards::router())
        .route("/health", get(health))
        .route("/openapi.json", get(openapi::openapi_json))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "ops",
    responses(
        (status = 200, description = "Store reachable", body = HealthStatus),
        (status = 503, description = "Store unreachable", body = HealthStatus),
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthStatus { status: "ok" })),
        Err(e) => {
            error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus { status: "degraded" }),
            )
        }
    }
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, Response},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for oneshot

    fn test_app() -> Router {
        build_app(AppState::in_memory())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res: Response<Body> = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Registers `username` and returns its token.
    async fn register(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/users/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct-horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn api_document_is_served() {
        let app = test_app();
        let (status, doc) = send(&app, "GET", "/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
        assert!(doc["paths"]["/groups/{id}/join"]["post"].is_object());
    }

    #[tokio::test]
    async fn login_returns_token_for_registered_user() {
        let app = test_app();
        let token = register(&app, "alice").await;

        let (status, body) = send(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "alice", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], token.as_str());

        let (status, me) = send(&app, "GET", "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "alice");

        let (status, user) = send(
            &app,
            "GET",
            &format!("/users/{}", me["id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "alice@example.com");
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_user() {
        let app = test_app();
        register(&app, "alice").await;

        for body in [
            json!({ "username": "alice", "password": "wrong-horse" }),
            json!({ "username": "mallory", "password": "correct-horse" }),
        ] {
            let (status, res) = send(&app, "POST", "/users/login", None, Some(body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(res["message"], "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn incomplete_login_is_unauthorized() {
        let app = test_app();
        register(&app, "alice").await;
        for body in [
            json!({}),
            json!({ "username": "ghost" }),
            json!({ "username": "alice", "password": "" }),
        ] {
            let (status, res) = send(&app, "POST", "/users/login", None, Some(body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(res["error"], "UNAUTHORIZED");
            assert_eq!(res["message"], "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn whitespace_password_is_rejected_at_registration() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "        ",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["password"].is_array());

        let (status, _) = send(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "alice", "password": "        " })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_validation_error() {
        let app = test_app();
        register(&app, "alice").await;
        let (status, body) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "correct-horse",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["username"].is_array());
    }

    #[tokio::test]
    async fn unknown_user_id_is_not_found() {
        let app = test_app();
        let token = register(&app, "alice").await;
        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/users/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_endpoints_require_a_valid_token() {
        let app = test_app();
        let (status, _) = send(&app, "GET", "/flashcards", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/flashcards", Some("deadbeef"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/groups",
            None,
            Some(json!({ "name": "x", "description": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // listing groups stays public
        let (status, body) = send(&app, "GET", "/groups", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn bearer_scheme_is_accepted() {
        let app = test_app();
        let token = register(&app, "alice").await;
        let req = Request::builder()
            .uri("/users/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bob_joins_alices_group() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let (status, group) = send(
            &app,
            "POST",
            "/groups",
            Some(&alice),
            Some(json!({ "name": "Algorithms", "description": "CS study" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(group["creator"]["username"], "alice");
        assert_eq!(group["members"].as_array().unwrap().len(), 1);
        let id = group["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "bob", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", &format!("/groups/{id}/join"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Joined group successfully");

        // public read, no token
        let (status, group) = send(&app, "GET", &format!("/groups/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(group["creator"]["username"], "alice");
        let members: Vec<&str> = group["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["username"].as_str().unwrap())
            .collect();
        assert_eq!(members, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn non_creator_is_forbidden_and_group_unchanged() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;
        let (_, group) = send(
            &app,
            "POST",
            "/groups",
            Some(&alice),
            Some(json!({ "name": "Algorithms", "description": "CS study" })),
        )
        .await;
        let uri = format!("/groups/{}", group["id"].as_str().unwrap());

        let (status, body) = send(&app, "PUT", &uri, Some(&bob), Some(json!({ "name": "Mine" }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");

        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, after) = send(&app, "GET", &uri, None, None).await;
        assert_eq!(after, group);
    }

    #[tokio::test]
    async fn creator_updates_partially_then_deletes_once() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let (_, group) = send(
            &app,
            "POST",
            "/groups",
            Some(&alice),
            Some(json!({ "name": "Algorithms", "description": "CS study" })),
        )
        .await;
        let uri = format!("/groups/{}", group["id"].as_str().unwrap());

        let (status, body) = send(&app, "PUT", &uri, Some(&alice), Some(json!({ "name": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["name"].is_array());

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(&alice),
            Some(json!({ "description": "Graphs and trees" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Algorithms");
        assert_eq!(updated["description"], "Graphs and trees");

        let (status, body) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_group_validates_input() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let (status, body) = send(&app, "POST", "/groups", Some(&alice), Some(json!({ "name": "Solo" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["description"].is_array());

        let req = Request::builder()
            .method("POST")
            .uri("/groups")
            .header(header::AUTHORIZATION, format!("Token {alice}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn group_listing_paginates() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        for i in 0..25 {
            let (status, _) = send(
                &app,
                "POST",
                "/groups",
                Some(&alice),
                Some(json!({ "name": format!("Group {i}"), "description": "d" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, first) = send(&app, "GET", "/groups", None, None).await;
        assert_eq!(first["count"], 25);
        assert_eq!(first["results"].as_array().unwrap().len(), 10);
        assert_eq!(first["next"], "/groups?page=2");
        assert_eq!(first["previous"], Value::Null);

        let (_, third) = send(&app, "GET", "/groups?page=3", None, None).await;
        assert_eq!(third["results"].as_array().unwrap().len(), 5);
        assert_eq!(third["next"], Value::Null);

        let (status, fourth) = send(&app, "GET", "/groups?page=4", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(fourth["results"].as_array().unwrap().is_empty());
        assert_eq!(fourth["next"], Value::Null);

        let (status, _) = send(&app, "GET", "/groups?page=abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bob_cannot_touch_alices_flashcard() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let (status, card) = send(
            &app,
            "POST",
            "/flashcards",
            Some(&alice),
            Some(json!({ "front": "2+2", "back": "4" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(card["category"], Value::Null);
        let uri = format!("/flashcards/{}", card["id"].as_str().unwrap());

        let (status, put) = send(&app, "PUT", &uri, Some(&bob), Some(json!({ "back": "5" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (missing_status, missing) = send(
            &app,
            "PUT",
            &format!("/flashcards/{}", uuid::Uuid::new_v4()),
            Some(&bob),
            Some(json!({ "back": "5" })),
        )
        .await;
        assert_eq!(missing_status, StatusCode::NOT_FOUND);
        assert_eq!(put, missing);

        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, bobs) = send(&app, "GET", "/flashcards", Some(&bob), None).await;
        assert_eq!(bobs["count"], 0);

        let (status, mine) = send(&app, "GET", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine, card);
        assert_eq!(mine["back"], "4");
    }

    #[tokio::test]
    async fn owner_manages_flashcard_lifecycle() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let (_, card) = send(
            &app,
            "POST",
            "/flashcards",
            Some(&alice),
            Some(json!({ "front": "Dijkstra", "back": "shortest paths", "category": "graphs" })),
        )
        .await;
        let uri = format!("/flashcards/{}", card["id"].as_str().unwrap());

        let (status, updated) = send(&app, "PUT", &uri, Some(&alice), Some(json!({ "category": null }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["category"], Value::Null);
        assert_eq!(updated["front"], "Dijkstra");
        assert_eq!(updated["created_at"], card["created_at"]);

        let (status, _) = send(&app, "PUT", &uri, Some(&alice), Some(json!({ "front": " " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send(&app, "GET", "/flashcards", Some(&alice), None).await;
        assert_eq!(list["count"], 1);
        assert_eq!(list["results"][0]["front"], "Dijkstra");

        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_flashcard_requires_front_and_back() {
        let app = test_app();
        let alice = register(&app, "alice").await;
        let (status, body) = send(&app, "POST", "/flashcards", Some(&alice), Some(json!({ "front": "lonely" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["back"].is_array());
        assert!(body["field_errors"].get("front").is_none());
    }
}
