//! WebSocket handler — connection lifecycle and event dispatch.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection id and enters a `select!` loop:
//! - Incoming client events → decode + dispatch by variant
//! - Broadcast events from room peers → forward to the client
//!
//! Handlers resolve the session, mutate room/session state through the
//! service layer, and return events addressed to the sender only;
//! room-scoped sends happen inside the room store under its write guard.
//! A handler failure is a local drop: logged and discarded, never answered.
//!
//! LIFECYCLE
//! =========
//! Unjoined → Joined → Closed. `join-room` is the only way in; action
//! events without a session are ignored; socket close is terminal and
//! triggers atomic cleanup (session removal, member removal, roster
//! rebroadcast, departure notice, destroy-on-empty).

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::{ClientEvent, ServerEvent};
use crate::services;
use crate::state::{AppState, Member};

// =============================================================================
// DROP TAXONOMY
// =============================================================================

/// Why an inbound event was dropped. Every class is recovered locally:
/// logged and discarded, with no error reply (the protocol has no error
/// acknowledgment, a gap preserved deliberately).
#[derive(Debug, thiserror::Error)]
enum DropReason {
    #[error("join requires a non-empty username and room")]
    EmptyJoinField,
    #[error("connection already joined a room")]
    AlreadyJoined,
    #[error("no session registered for this connection")]
    NoSession,
    #[error("message not in current history: {0}")]
    UnknownMessage(Uuid),
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast events from room peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(256);

    info!(%conn_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for event in process_inbound_text(&state, conn_id, &client_tx, &text).await {
                            let _ = send_event(&mut socket, &event).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    handle_disconnect(&state, conn_id).await;
    info!(%conn_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Decode and process one inbound text frame, returning events addressed
/// to the sender only (room-scoped events flow through peer channels).
///
/// Kept separate from the socket loop so tests can exercise dispatch and
/// broadcast behavior end-to-end.
async fn process_inbound_text(
    state: &AppState,
    conn_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) -> Vec<ServerEvent> {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%conn_id, error = %e, "ws: dropped malformed event");
            return Vec::new();
        }
    };

    let result = match event {
        ClientEvent::JoinRoom { username, room } => {
            handle_join(state, conn_id, client_tx, &username, &room).await
        }
        ClientEvent::SendMessage { text } => handle_send(state, conn_id, &text).await,
        ClientEvent::AddReaction { message_id, emoji } => {
            handle_reaction(state, conn_id, message_id, &emoji).await
        }
        ClientEvent::Typing(is_typing) => handle_typing(state, conn_id, is_typing).await,
    };

    match result {
        Ok(events) => events,
        Err(reason @ (DropReason::EmptyJoinField | DropReason::AlreadyJoined)) => {
            warn!(%conn_id, %reason, "ws: dropped join event");
            Vec::new()
        }
        Err(reason) => {
            // Expected races (late events, evicted messages) are routine.
            debug!(%conn_id, %reason, "ws: dropped event");
            Vec::new()
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Unjoined → Joined. Binds identity, assigns a color, adds the member to
/// its room, and replies with the history snapshot. Roster and join-notice
/// broadcasts happen inside the room store.
async fn handle_join(
    state: &AppState,
    conn_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    username: &str,
    room: &str,
) -> Result<Vec<ServerEvent>, DropReason> {
    let username = username.trim();
    let room = room.trim();
    if username.is_empty() || room.is_empty() {
        return Err(DropReason::EmptyJoinField);
    }
    // One join per connection lifetime; a repeat join is protocol misuse.
    if services::session::lookup(state, conn_id).await.is_some() {
        return Err(DropReason::AlreadyJoined);
    }

    let session = services::session::register(state, conn_id, username, room).await;
    let member = Member { username: session.username, color: session.color };
    let history = services::room::join(state, room, conn_id, member, client_tx.clone()).await;

    info!(%conn_id, username, room, "ws: joined room");
    Ok(vec![ServerEvent::RoomMessages(history)])
}

async fn handle_send(
    state: &AppState,
    conn_id: Uuid,
    text: &str,
) -> Result<Vec<ServerEvent>, DropReason> {
    let session = services::session::lookup(state, conn_id)
        .await
        .ok_or(DropReason::NoSession)?;

    let msg = services::message::compose(&session.username, &session.color, text);
    services::room::append_message(state, &session.room, msg).await;
    Ok(Vec::new())
}

async fn handle_reaction(
    state: &AppState,
    conn_id: Uuid,
    message_id: Uuid,
    emoji: &str,
) -> Result<Vec<ServerEvent>, DropReason> {
    let session = services::session::lookup(state, conn_id)
        .await
        .ok_or(DropReason::NoSession)?;

    services::room::toggle_reaction(state, &session.room, message_id, emoji, &session.username)
        .await
        .ok_or(DropReason::UnknownMessage(message_id))?;
    Ok(Vec::new())
}

async fn handle_typing(
    state: &AppState,
    conn_id: Uuid,
    is_typing: bool,
) -> Result<Vec<ServerEvent>, DropReason> {
    let session = services::session::lookup(state, conn_id)
        .await
        .ok_or(DropReason::NoSession)?;

    services::room::typing(state, &session.room, conn_id, &session.username, is_typing).await;
    Ok(Vec::new())
}

// =============================================================================
// CLEANUP
// =============================================================================

/// Closed is terminal. Removes the session and the room membership in one
/// pass; a connection that never joined has nothing to clean up.
async fn handle_disconnect(state: &AppState, conn_id: Uuid) {
    let Some(session) = services::session::remove(state, conn_id).await else {
        return;
    };
    let remaining =
        services::room::leave(state, &session.room, conn_id, &session.username).await;
    info!(%conn_id, username = %session.username, room = %session.room, remaining, "ws: session closed");
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
