//! WebSocket connection lifecycle and realtime event dispatch.
//!
//! Identity is resolved once during the handshake and bound into a
//! [`SessionContext`]; the connect/disconnect transitions are the only call
//! sites that mutate the presence counter. Per-request failures are reported
//! to the offending sender only, never broadcast.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use kaiwa_core::{
    ClientEvent, Error, Identity, MessageRepository, NewChatMessage, Result, ServerEvent,
    SessionResolver,
};

use crate::guard::ChannelAction;
use crate::session::SessionContext;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// WebSocket entry point (`GET /ws?token=…`).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Resolve identity before any event handling begins; a resolution error
    // degrades to an unauthenticated connection (fails closed downstream).
    let identity: Option<Identity> = match &params.token {
        Some(token) => match state.sessions.resolve(token).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(
                    subsystem = "server",
                    component = "ws",
                    error = %err,
                    "Session resolution failed during handshake"
                );
                None
            }
        },
        None => None,
    };
    ws.on_upgrade(move |socket| handle_connection(socket, state, identity))
}

async fn handle_connection(socket: WebSocket, state: AppState, identity: Option<Identity>) {
    let (connection_id, mut outbox) = state.registry.register(identity.clone()).await;
    let ctx = SessionContext {
        connection_id,
        identity,
    };

    let count = state.presence.connect();
    info!(
        subsystem = "server",
        component = "ws",
        connection_id = ?connection_id,
        active = count,
        authenticated = ctx.identity.is_some(),
        "Connection opened"
    );
    state
        .registry
        .broadcast_all(ServerEvent::PresenceCount { count })
        .await;

    let (mut sender, mut receiver) = socket.split();

    // Forward outbox events to the client.
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Handle inbound events from the client.
    let recv_state = state.clone();
    let recv_ctx = ctx.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => handle_client_event(&recv_state, &recv_ctx, event).await,
                    Err(err) => {
                        recv_state
                            .registry
                            .send_to(
                                recv_ctx.connection_id,
                                ServerEvent::Error {
                                    message: format!("invalid event: {}", err),
                                },
                            )
                            .await;
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    state.registry.remove(connection_id).await;
    let count = state.presence.disconnect();
    state
        .registry
        .broadcast_all(ServerEvent::PresenceCount { count })
        .await;
    info!(
        subsystem = "server",
        component = "ws",
        connection_id = ?connection_id,
        active = count,
        "Connection closed"
    );
}

/// Dispatch one inbound event; failures go to the sender only.
pub async fn handle_client_event(state: &AppState, ctx: &SessionContext, event: ClientEvent) {
    if let Err(err) = dispatch(state, ctx, event).await {
        debug!(
            subsystem = "server",
            component = "ws",
            connection_id = ?ctx.connection_id,
            error = %err,
            "Event rejected"
        );
        state
            .registry
            .send_to(
                ctx.connection_id,
                ServerEvent::Error {
                    message: err.to_string(),
                },
            )
            .await;
    }
}

async fn dispatch(state: &AppState, ctx: &SessionContext, event: ClientEvent) -> Result<()> {
    match event {
        ClientEvent::SendMessage { text, channel } => {
            let identity = ctx.require_identity()?;
            if !state
                .guard
                .allowed(Some(identity), channel, ChannelAction::Send)
            {
                return Err(Error::Forbidden(format!("cannot send to {}", channel)));
            }
            if text.trim().is_empty() {
                return Err(Error::InvalidInput("empty message".to_string()));
            }

            // Persistence failure aborts here; nothing is fanned out.
            let saved = state
                .messages
                .append(NewChatMessage {
                    author_id: identity.id,
                    author_display_name: identity.display_name.clone(),
                    author_avatar_url: identity.avatar_url.clone(),
                    text,
                    channel,
                })
                .await?;

            let recipients = state
                .registry
                .broadcast(&state.guard, channel, ServerEvent::message_received(&saved))
                .await;
            debug!(
                subsystem = "server",
                component = "ws",
                op = "broadcast",
                channel = %channel,
                message_id = %saved.id,
                recipient_count = recipients,
                "Message fanned out"
            );
            Ok(())
        }
        ClientEvent::RequestDelete { message_id, .. } => {
            let identity = ctx.require_identity()?;
            // The fan-out channel comes from the persisted record; the
            // client-supplied channel is never trusted for routing.
            let deleted = state.messages.mark_deleted(message_id, identity.id).await?;
            state
                .registry
                .broadcast(
                    &state.guard,
                    deleted.channel,
                    ServerEvent::MessageDeleted { message_id },
                )
                .await;
            Ok(())
        }
        ClientEvent::FacilitatorBroadcast { response } => {
            ctx.require_identity()?;
            state
                .registry
                .broadcast_except(
                    ctx.connection_id,
                    ServerEvent::FacilitatorResponse { response },
                )
                .await;
            Ok(())
        }
    }
}
