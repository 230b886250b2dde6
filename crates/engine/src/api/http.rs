//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use levelup_shared::{ChatReply, ChatRequest, ErrorBody, GamesResponse, LevelsResponse};

use crate::app::App;
use crate::infrastructure::ports::GameApiError;
use crate::use_cases::{CatalogError, PlayTurnError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/games", get(list_games))
        .route("/api/levels", get(list_levels))
        .route("/api/chat", post(chat))
        .route("/api/chat/", post(chat))
}

async fn health() -> &'static str {
    "OK"
}

async fn list_games(State(app): State<Arc<App>>) -> Result<Json<GamesResponse>, ApiError> {
    let games = app
        .use_cases
        .catalog
        .list_games
        .execute()
        .await
        .map_err(|e| ApiError::from_catalog("Failed to fetch games", e))?;
    Ok(Json(GamesResponse::from_games(&games)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelsQuery {
    game_name: Option<String>,
}

async fn list_levels(
    State(app): State<Arc<App>>,
    Query(query): Query<LevelsQuery>,
) -> Result<Json<LevelsResponse>, ApiError> {
    let levels = app
        .use_cases
        .catalog
        .list_levels
        .execute(query.game_name.as_deref())
        .await
        .map_err(|e| ApiError::from_catalog("Failed to fetch levels", e))?;
    Ok(Json(LevelsResponse::from_levels(&levels)))
}

async fn chat(
    State(app): State<Arc<App>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let reply = app
        .use_cases
        .play_turn
        .execute(request)
        .await
        .map_err(|e| match e {
            PlayTurnError::Validation(msg) => ApiError::BadRequest(msg),
            PlayTurnError::GameApi(e) => ApiError::from_game_api("Failed to play turn", e),
        })?;
    Ok(Json(reply))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Configuration(String),
    Upstream { status: StatusCode, message: String },
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    fn from_game_api(context: &str, error: GameApiError) -> Self {
        match error {
            GameApiError::NotConfigured | GameApiError::InvalidBaseUrl(_) => {
                ApiError::Configuration(error.to_string())
            }
            GameApiError::Upstream { status, message } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message: format!("{context}: {status} {message}"),
            },
            GameApiError::InvalidResponse(_) => {
                ApiError::BadGateway(format!("{context}: {error}"))
            }
            GameApiError::Timeout | GameApiError::RequestFailed(_) => {
                ApiError::Internal(format!("{context}: {error}"))
            }
        }
    }

    fn from_catalog(context: &str, error: CatalogError) -> Self {
        match error {
            CatalogError::GameApi(e) => Self::from_game_api(context, e),
            CatalogError::Shape(e) => ApiError::BadGateway(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Upstream { status, message } => (status, message),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{GameTurnMessage, GameTurnResult, MockGameApiPort};
    use axum::body::Body;
    use axum::http::Request;
    use levelup_domain::Role;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router(game_api: MockGameApiPort) -> Router {
        routes().with_state(Arc::new(App::new(Arc::new(game_api))))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn chat_body() -> Value {
        json!({
            "id": "c1",
            "history": [],
            "message": "hello",
            "levelId": "1",
            "game": "password"
        })
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = router(MockGameApiPort::new())
            .oneshot(get("/api/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn games_are_normalized() {
        let mut game_api = MockGameApiPort::new();
        game_api
            .expect_list_games()
            .returning(|| Ok(json!([{"name": "password"}])));

        let (status, body) = send(router(game_api), get("/api/games")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"games": [{"name": "password", "description": "password", "endpoint": ""}]})
        );
    }

    #[tokio::test]
    async fn levels_use_the_game_name_query() {
        let mut game_api = MockGameApiPort::new();
        game_api
            .expect_list_levels()
            .withf(|game| game == "riddles")
            .returning(|_| Ok(json!({"levels": [{"id": 1, "objective": "Solve it"}]})));

        let (status, body) = send(router(game_api), get("/api/levels?gameName=riddles")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"levels": [{"id": "1", "name": "Level 1", "userObjective": "Solve it"}]})
        );
    }

    #[tokio::test]
    async fn upstream_status_is_forwarded() {
        let mut game_api = MockGameApiPort::new();
        game_api.expect_list_levels().returning(|_| {
            Err(GameApiError::Upstream {
                status: 404,
                message: "Not Found".to_string(),
            })
        });

        let (status, body) = send(router(game_api), get("/api/levels")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Failed to fetch levels: 404 Not Found"}));
    }

    #[tokio::test]
    async fn missing_configuration_is_a_server_error() {
        let mut game_api = MockGameApiPort::new();
        game_api
            .expect_list_games()
            .returning(|| Err(GameApiError::NotConfigured));

        let (status, body) = send(router(game_api), get("/api/games")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "GAME_API_URL environment variable is not configured"})
        );
    }

    #[tokio::test]
    async fn malformed_catalog_is_a_bad_gateway() {
        let mut game_api = MockGameApiPort::new();
        game_api
            .expect_list_games()
            .returning(|| Ok(json!({"unexpected": true})));

        let (status, body) = send(router(game_api), get("/api/games")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            json!({"error": "Invalid response format: expected array of games"})
        );
    }

    #[tokio::test]
    async fn chat_reshapes_the_game_reply() {
        let mut game_api = MockGameApiPort::new();
        game_api.expect_play_turn().times(1).returning(|turn| {
            Ok(GameTurnResult {
                messages: vec![
                    GameTurnMessage::new(Role::User, turn.message),
                    GameTurnMessage::new(Role::Assistant, "try again"),
                ],
                passed: false,
                pass_rationale: String::new(),
            })
        });

        let (status, body) = send(router(game_api), post_json("/api/chat", chat_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "messages": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "try again"}
                ],
                "passed": false,
                "pass_rationale": "",
                "error": false
            })
        );
    }

    #[tokio::test]
    async fn chat_accepts_trailing_slash() {
        let mut game_api = MockGameApiPort::new();
        game_api.expect_play_turn().returning(|_| {
            Ok(GameTurnResult {
                messages: vec![],
                passed: false,
                pass_rationale: String::new(),
            })
        });

        let (status, _) = send(router(game_api), post_json("/api/chat/", chat_body())).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_chat_bodies_are_bad_requests() {
        let mut game_api = MockGameApiPort::new();
        game_api.expect_play_turn().never();
        let router = router(game_api);

        let mut too_long = chat_body();
        too_long["message"] = json!("x".repeat(2001));
        let (status, body) = send(router.clone(), post_json("/api/chat", too_long)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(router, post_json("/api/chat", json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn chat_timeouts_hide_details() {
        let mut game_api = MockGameApiPort::new();
        game_api
            .expect_play_turn()
            .returning(|_| Err(GameApiError::Timeout));

        let (status, body) = send(router(game_api), post_json("/api/chat", chat_body())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }
}
