//! Game API client - forwards catalog and turn requests over HTTP.
//!
//! Upstream routes, relative to the configured base URL:
//!
//! - `GET  /api/v1/games` - game catalog
//! - `GET  /api/v1/games/{game}` - level catalog
//! - `POST /api/v1/games/{game}/{level}` - play one turn
//!
//! Path segments are percent-encoded, so game names and level ids may contain
//! spaces or slashes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use levelup_domain::Role;

use super::ports::{GameApiError, GameApiPort, GameTurnMessage, GameTurnRequest, GameTurnResult};
use crate::config::ProxyConfig;

/// Wire label the game API uses for player turns. Anything else is the game.
const HUMAN: &str = "human";
const AI: &str = "ai";

#[derive(Clone)]
pub struct GameApiClient {
    client: Client,
    base_url: Option<String>,
    turn_timeout: Duration,
    catalog_timeout: Duration,
}

impl GameApiClient {
    pub fn new(base_url: Option<&str>, turn_timeout: Duration, catalog_timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("levelup-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            turn_timeout,
            catalog_timeout,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(
            config.game_api_url.as_deref(),
            config.turn_timeout,
            config.catalog_timeout,
        )
    }

    /// `{base}/api/v1/games/{segments...}`
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GameApiError> {
        let base = self.base_url.as_deref().ok_or(GameApiError::NotConfigured)?;
        let mut url = Url::parse(base).map_err(|e| GameApiError::InvalidBaseUrl(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GameApiError::InvalidBaseUrl(base.to_string()))?;
            path.pop_if_empty()
                .extend(["api", "v1", "games"])
                .extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GameApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Game API returned an error");
            return Err(GameApiError::Upstream {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response)
    }

    async fn get_catalog(&self, segments: &[&str]) -> Result<Value, GameApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(url = %url, "Fetching catalog from game API");

        let response = self
            .send(self.client.get(url).timeout(self.catalog_timeout))
            .await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| GameApiError::InvalidResponse(e.to_string()))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> GameApiError {
    if error.is_timeout() {
        GameApiError::Timeout
    } else {
        GameApiError::RequestFailed(error.to_string())
    }
}

fn wire_type(role: Role) -> &'static str {
    match role {
        Role::User => HUMAN,
        Role::Assistant => AI,
    }
}

fn role_from_wire(kind: &str) -> Role {
    if kind == HUMAN {
        Role::User
    } else {
        Role::Assistant
    }
}

#[async_trait]
impl GameApiPort for GameApiClient {
    async fn list_games(&self) -> Result<Value, GameApiError> {
        self.get_catalog(&[]).await
    }

    async fn list_levels(&self, game: &str) -> Result<Value, GameApiError> {
        self.get_catalog(&[game]).await
    }

    async fn play_turn(&self, request: GameTurnRequest) -> Result<GameTurnResult, GameApiError> {
        let url = self.endpoint(&[&request.game, &request.level_id])?;

        let body = UpstreamTurnRequest {
            history: request
                .history
                .iter()
                .map(|message| UpstreamMessage {
                    content: message.content.clone(),
                    kind: wire_type(message.role).to_string(),
                })
                .collect(),
            message: request.message,
        };

        tracing::debug!(
            url = %url,
            history_len = body.history.len(),
            "Forwarding turn to game API"
        );

        let response = self
            .send(self.client.post(url).json(&body).timeout(self.turn_timeout))
            .await?;

        let reply: UpstreamTurnResponse = response
            .json()
            .await
            .map_err(|e| GameApiError::InvalidResponse(e.to_string()))?;

        Ok(GameTurnResult {
            messages: reply
                .messages
                .into_iter()
                .map(|message| GameTurnMessage::new(role_from_wire(&message.kind), message.content))
                .collect(),
            passed: reply.passed,
            pass_rationale: reply.pass_rationale,
        })
    }
}

// =============================================================================
// Game API wire types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct UpstreamMessage {
    content: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct UpstreamTurnRequest {
    history: Vec<UpstreamMessage>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamTurnResponse {
    messages: Vec<UpstreamMessage>,
    #[serde(default)]
    passed: bool,
    #[serde(default)]
    pass_rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> GameApiClient {
        GameApiClient::new(
            Some(base_url),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn play_turn_translates_roles_both_ways() {
        let router = Router::new().route(
            "/api/v1/games/{game}/{level}",
            post(
                |Path((game, level)): Path<(String, String)>, Json(body): Json<Value>| async move {
                    let types: Vec<String> = body["history"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|m| m["type"].as_str().unwrap().to_string())
                        .collect();
                    Json(json!({
                        "messages": [
                            {"content": body["message"], "type": "human"},
                            {"content": "nope", "type": "ai"},
                            {"content": "system note", "type": "system"},
                        ],
                        "passed": false,
                        "pass_rationale": format!("{game}/{level}:{}", types.join(",")),
                    }))
                },
            ),
        );
        let base = spawn_upstream(router).await;

        let result = client(&base)
            .play_turn(GameTurnRequest {
                game: "password".to_string(),
                level_id: "2".to_string(),
                history: vec![
                    GameTurnMessage::new(Role::User, "hi"),
                    GameTurnMessage::new(Role::Assistant, "hello"),
                ],
                message: "open sesame".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.pass_rationale, "password/2:human,ai");
        assert!(!result.passed);
        assert_eq!(
            result.messages,
            vec![
                GameTurnMessage::new(Role::User, "open sesame"),
                GameTurnMessage::new(Role::Assistant, "nope"),
                GameTurnMessage::new(Role::Assistant, "system note"),
            ]
        );
    }

    #[tokio::test]
    async fn path_segments_are_percent_encoded() {
        let router = Router::new().route(
            "/api/v1/games/{game}",
            get(|Path(game): Path<String>| async move { Json(json!({"levels": [{"id": game}]})) }),
        );
        let base = spawn_upstream(router).await;

        let raw = client(&format!("{base}/")).list_levels("my game/v2").await.unwrap();

        assert_eq!(raw, json!({"levels": [{"id": "my game/v2"}]}));
    }

    #[tokio::test]
    async fn upstream_failures_keep_their_status() {
        let router = Router::new().route(
            "/api/v1/games",
            get(|| async { (StatusCode::NOT_FOUND, "no such thing") }),
        );
        let base = spawn_upstream(router).await;

        let err = client(&base).list_games().await.unwrap_err();

        assert_eq!(
            err,
            GameApiError::Upstream {
                status: 404,
                message: "Not Found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_json_catalog_is_an_invalid_response() {
        let router = Router::new().route("/api/v1/games", get(|| async { "<html>" }));
        let base = spawn_upstream(router).await;

        let err = client(&base).list_games().await.unwrap_err();

        assert!(matches!(err, GameApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn slow_turns_time_out() {
        let router = Router::new().route(
            "/api/v1/games/{game}/{level}",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"messages": []}))
            }),
        );
        let base = spawn_upstream(router).await;
        let client = GameApiClient::new(
            Some(&base),
            Duration::from_millis(100),
            Duration::from_secs(5),
        );

        let err = client
            .play_turn(GameTurnRequest {
                game: "password".to_string(),
                level_id: "1".to_string(),
                history: vec![],
                message: "hi".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, GameApiError::Timeout);
    }

    #[tokio::test]
    async fn missing_base_url_is_not_configured() {
        let client = GameApiClient::new(None, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(
            client.list_games().await.unwrap_err(),
            GameApiError::NotConfigured
        );

        let client = GameApiClient::new(
            Some("not a url"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert!(matches!(
            client.list_games().await.unwrap_err(),
            GameApiError::InvalidBaseUrl(_)
        ));
    }
}
