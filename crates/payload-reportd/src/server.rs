//! Webhook endpoints for the chat platform's event API.
//!
//! - `POST /`: `url_verification` handshakes and `event_callback` mentions
//! - `GET /health`: liveness

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::bot::{ChatEvent, ReportBot};
use crate::error::BotResult;

type AppState = Arc<ReportBot>;

#[derive(Debug, Deserialize)]
struct EventRequest {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    challenge: String,
    #[serde(default)]
    event: ChatEvent,
}

#[derive(Debug, Serialize)]
struct VerificationResponse {
    challenge: String,
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(bot: Arc<ReportBot>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "payload report bot listening");
    axum::serve(listener, router(bot)).await
}

/// Build the axum router (separated for testing).
pub fn router(bot: Arc<ReportBot>) -> Router {
    Router::new()
        .route("/", post(events))
        .route("/health", get(health))
        .with_state(bot)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn events(State(bot): State<AppState>, body: Bytes) -> BotResult<Response> {
    let req: EventRequest = serde_json::from_slice(&body)?;
    match req.kind.as_str() {
        "url_verification" => Ok(Json(VerificationResponse {
            challenge: req.challenge,
        })
        .into_response()),
        "event_callback" => {
            bot.handle_event(&req.event).await?;
            Ok(StatusCode::OK.into_response())
        }
        other => {
            debug!(kind = other, "ignoring request type");
            Ok(StatusCode::OK.into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::tests::{bot, source, RecordingChat};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<RecordingChat>) {
        let chat = Arc::new(RecordingChat::default());
        (router(Arc::new(bot(source(), chat.clone()))), chat)
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let (app, chat) = app();
        let resp = app
            .oneshot(post_json(
                r#"{"token":"t","type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["challenge"],
            "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        );
        assert!(chat.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_callback_runs_command() {
        let (app, chat) = app();
        let resp = app
            .oneshot(post_json(
                r#"{"type":"event_callback","event":{"type":"app_mention","text":"<@UE23Q9BFY> help","user":"U1","channel":"C9","ts":"1.5"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let posted = chat.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].channel, "C9");
        assert!(posted[0].text.starts_with("*help* - this help text"));
    }

    #[tokio::test]
    async fn test_invalid_argument_is_server_error() {
        let (app, _) = app();
        let resp = app
            .oneshot(post_json(
                r#"{"type":"event_callback","event":{"text":"report arch=vax","channel":"C9","ts":"1.6"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let (app, _) = app();
        let resp = app.oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
