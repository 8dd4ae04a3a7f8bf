//! Room store — membership, bounded history, and audience-scoped fan-out.
//!
//! DESIGN
//! ======
//! Rooms are created lazily on first join and destroyed when their last
//! member leaves. Each public function acquires the room store's write
//! guard once and performs the mutation and its resulting sends before
//! releasing it, so per-room event order matches processing order even
//! under parallel connection tasks.
//!
//! Fan-out is best-effort: events go to per-connection mpsc channels via
//! `try_send`, and a full or closed channel skips that client.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::event::ServerEvent;
use crate::services::message;
use crate::state::{AppState, ChatMessage, MAX_HISTORY, Member, Reactions, RoomState};

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Add a member to a room, creating the room on first join. Registers the
/// member's outbound channel, rebroadcasts the roster to the whole room,
/// and notifies everyone except the joiner. Returns the history snapshot
/// for the joiner.
pub async fn join(
    state: &AppState,
    room_name: &str,
    conn_id: Uuid,
    member: Member,
    tx: mpsc::Sender<ServerEvent>,
) -> Vec<ChatMessage> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(room_name.to_string()).or_default();
    room.clients.insert(conn_id, tx);
    room.members.insert(conn_id, member.clone());

    let history: Vec<ChatMessage> = room.history.iter().cloned().collect();
    fanout(room, &ServerEvent::RoomUsers(roster_of(room)), None);
    fanout(
        room,
        &ServerEvent::UserJoined { username: member.username, timestamp: message::clock_time() },
        Some(conn_id),
    );

    info!(%conn_id, room = room_name, members = room.members.len(), "member joined room");
    history
}

/// Remove a member from a room. If members remain, rebroadcasts the roster
/// and a departure notice to them (the departing connection is already
/// gone from the client map, so it receives neither). Destroys the room,
/// history included, when the member map empties. Returns the member count
/// after removal.
pub async fn leave(state: &AppState, room_name: &str, conn_id: Uuid, username: &str) -> usize {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_name) else {
        return 0;
    };

    room.members.remove(&conn_id);
    room.clients.remove(&conn_id);
    let remaining = room.members.len();

    if remaining == 0 {
        rooms.remove(room_name);
        info!(room = room_name, "destroyed empty room");
    } else {
        fanout(room, &ServerEvent::RoomUsers(roster_of(room)), None);
        fanout(
            room,
            &ServerEvent::UserLeft {
                username: username.to_string(),
                timestamp: message::clock_time(),
            },
            None,
        );
        info!(%conn_id, room = room_name, remaining, "member left room");
    }
    remaining
}

/// Snapshot the presence roster for a room. Order-insensitive.
pub async fn roster(state: &AppState, room_name: &str) -> Vec<Member> {
    let rooms = state.rooms.read().await;
    rooms.get(room_name).map(roster_of).unwrap_or_default()
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Append a message to a room's history and broadcast it to the whole
/// room, sender included. Evicts oldest-first once the history exceeds
/// `MAX_HISTORY`; an evicted message id is no longer resolvable.
pub async fn append_message(state: &AppState, room_name: &str, msg: ChatMessage) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_name) else {
        return;
    };

    room.history.push_back(msg.clone());
    while room.history.len() > MAX_HISTORY {
        room.history.pop_front();
    }
    fanout(room, &ServerEvent::NewMessage(msg), None);
}

/// Toggle `username`'s reaction on a message still in the room's history
/// and broadcast the updated reaction map to the whole room. Returns the
/// updated map, or `None` if the message id is not in current history
/// (evicted or never existed) — the caller drops the event silently.
pub async fn toggle_reaction(
    state: &AppState,
    room_name: &str,
    message_id: Uuid,
    emoji: &str,
    username: &str,
) -> Option<Reactions> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(room_name)?;

    let reactions = {
        let msg = room.history.iter_mut().find(|m| m.id == message_id)?;
        message::toggle_reaction(&mut msg.reactions, emoji, username);
        msg.reactions.clone()
    };
    fanout(
        room,
        &ServerEvent::ReactionUpdated { message_id, reactions: reactions.clone() },
        None,
    );
    Some(reactions)
}

// =============================================================================
// EPHEMERAL
// =============================================================================

/// Relay a typing indicator to everyone in the room except the typist.
/// Ephemeral: no state is recorded.
pub async fn typing(
    state: &AppState,
    room_name: &str,
    conn_id: Uuid,
    username: &str,
    is_typing: bool,
) {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(room_name) else {
        return;
    };
    fanout(
        room,
        &ServerEvent::UserTyping { username: username.to_string(), is_typing },
        Some(conn_id),
    );
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Send an event to every client in a room, optionally excluding one
/// connection.
fn fanout(room: &RoomState, event: &ServerEvent, exclude: Option<Uuid>) {
    for (conn_id, tx) in &room.clients {
        if exclude == Some(*conn_id) {
            continue;
        }
        let _ = tx.try_send(event.clone());
    }
}

fn roster_of(room: &RoomState) -> Vec<Member> {
    room.members.values().cloned().collect()
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
