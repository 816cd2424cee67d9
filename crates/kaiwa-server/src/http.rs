//! HTTP surface: history, conversation memory, AI queries, facilitator.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use kaiwa_core::defaults::{FACILITATOR_WINDOW, HISTORY_LIMIT};
use kaiwa_core::{
    Channel, ContextMode, ConversationRepository, Error, FacilitatorCommand, MessageRepository,
};

use crate::guard::ChannelAction;
use crate::session::authenticate;
use crate::state::AppState;
use crate::ws;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws::ws_handler))
        .route("/api/v1/messages", get(fetch_history))
        .route("/api/v1/messages/:id", axum::routing::delete(delete_message))
        .route("/api/v1/memory", get(fetch_memory).delete(clear_memory))
        .route("/api/v1/ai/query", post(ai_query))
        .route("/api/v1/ai/facilitator", post(ai_facilitator))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Largest window a client may request in one call.
const MAX_LIMIT: i64 = 500;

/// Clamp a client-supplied row limit before it reaches a `LIMIT` clause.
fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}

#[derive(Deserialize)]
struct HistoryParams {
    channel: Channel,
    limit: Option<i64>,
}

/// Channel history, oldest→newest, deleted rows excluded.
async fn fetch_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    if !state
        .guard
        .allowed(Some(&identity), params.channel, ChannelAction::Read)
    {
        return Err(Error::Forbidden(format!("cannot read {}", params.channel)).into());
    }
    let messages = state
        .messages
        .find_recent(params.channel, clamp_limit(params.limit, HISTORY_LIMIT), false)
        .await?;
    Ok(Json(serde_json::json!({ "messages": messages })))
}

/// Logically delete one of the caller's own messages.
async fn delete_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    state.messages.mark_deleted(message_id, identity.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct MemoryParams {
    limit: Option<i64>,
}

/// Owner-scoped conversation memory window.
async fn fetch_memory(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<MemoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let turns = state
        .conversations
        .window(identity.id, clamp_limit(params.limit, HISTORY_LIMIT))
        .await?;
    Ok(Json(serde_json::json!({ "turns": turns })))
}

/// Owner-scoped clear; always succeeds (no-op if absent).
async fn clear_memory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    state.conversations.clear(identity.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiQueryRequest {
    text: String,
    mode: ContextMode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AiQueryResponse {
    response_text: String,
    /// Source labels, or null when the reply was unaugmented.
    sources: Option<Vec<String>>,
}

async fn ai_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AiQueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    if req.text.trim().is_empty() {
        return Err(Error::InvalidInput("empty query".to_string()).into());
    }
    let reply = state
        .assistant
        .respond(&identity, &req.text, req.mode)
        .await?;
    Ok(Json(AiQueryResponse {
        response_text: reply.response_text,
        sources: if reply.sources.is_empty() {
            None
        } else {
            Some(reply.sources)
        },
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FacilitatorRequest {
    #[serde(flatten)]
    command: FacilitatorCommand,
    channel: Option<Channel>,
    window_size: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FacilitatorResponse {
    response_text: String,
}

async fn ai_facilitator(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FacilitatorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let channel = req.channel.unwrap_or(Channel::General);
    // Operating on the admin channel's message set requires the admin role.
    if !state
        .guard
        .allowed(Some(&identity), channel, ChannelAction::Read)
    {
        return Err(Error::Forbidden(format!("cannot facilitate {}", channel)).into());
    }
    let response_text = state
        .assistant
        .facilitate(
            channel,
            &req.command,
            clamp_limit(req.window_size, FACILITATOR_WINDOW),
        )
        .await?;
    Ok(Json(FacilitatorResponse { response_text }))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    UpstreamFailed(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Unauthenticated(msg) => ApiError::Unauthenticated(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::RetrievalFailed(msg) | Error::CompletionFailed(msg) => {
                ApiError::UpstreamFailed(msg)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UpstreamFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (
                ApiError::from(Error::Unauthenticated("x".to_string())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(Error::Forbidden("x".to_string())),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(Error::NotFound("x".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(Error::InvalidInput("x".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(Error::RetrievalFailed("x".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from(Error::CompletionFailed("x".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_clamp_limit_rejects_hostile_values() {
        assert_eq!(clamp_limit(None, 50), 50);
        assert_eq!(clamp_limit(Some(10), 50), 10);
        assert_eq!(clamp_limit(Some(0), 50), 1);
        assert_eq!(clamp_limit(Some(-7), 50), 1);
        assert_eq!(clamp_limit(Some(i64::MAX), 50), MAX_LIMIT);
    }

    #[test]
    fn test_ai_query_response_empty_sources_serialize_null() {
        let json = serde_json::to_value(AiQueryResponse {
            response_text: "plain answer".to_string(),
            sources: None,
        })
        .unwrap();
        assert_eq!(json["responseText"], "plain answer");
        assert!(json["sources"].is_null());

        let json = serde_json::to_value(AiQueryResponse {
            response_text: "cited answer".to_string(),
            sources: Some(vec!["alpha.pdf".to_string()]),
        })
        .unwrap();
        assert_eq!(json["sources"][0], "alpha.pdf");
    }

    #[test]
    fn test_facilitator_request_flattens_command() {
        let req: FacilitatorRequest = serde_json::from_str(
            r#"{"command":"keywordSearch","term":"q3","channel":"admin","windowSize":20}"#,
        )
        .unwrap();
        assert_eq!(
            req.command,
            FacilitatorCommand::KeywordSearch {
                term: "q3".to_string()
            }
        );
        assert_eq!(req.channel, Some(Channel::Admin));
        assert_eq!(req.window_size, Some(20));
    }
}
