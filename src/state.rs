//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the two process-wide stores: the session registry (connection id →
//! identity) and the room store (room name → live room state). Both are
//! constructed once in `main` and threaded explicitly so tests can
//! instantiate fresh stores per test.
//!
//! OWNERSHIP
//! =========
//! The room store exclusively owns rooms and their message history; the
//! session registry exclusively owns sessions. A session points into the
//! room store only by room name. Invariant: a room's `members` map mirrors
//! exactly the set of live sessions whose `room` field names that room, and
//! `clients` mirrors the keys of `members`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::event::ServerEvent;

/// Per-room history bound. Eviction is oldest-first truncation.
pub const MAX_HISTORY: usize = 100;

// =============================================================================
// MESSAGE
// =============================================================================

/// Emoji → usernames who reacted with it. No duplicate username per emoji;
/// no empty entry persists. `BTreeMap` keeps snapshots deterministic.
pub type Reactions = BTreeMap<String, Vec<String>>;

/// A stored chat message. Immutable after creation except for its reaction
/// map; never deleted individually, only evicted in bulk by the history
/// bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub username: String,
    /// Snapshot of the sender's session color at send time.
    pub color: String,
    pub text: String,
    /// Human-readable wall-clock time, server-generated.
    pub timestamp: String,
    pub reactions: Reactions,
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Roster entry for one room member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub username: String,
    pub color: String,
}

/// Identity bound to one live connection. Created on join, removed on
/// disconnect; the room binding never changes for the life of the
/// connection.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub room: String,
    pub color: String,
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room live state. Created lazily on first join, destroyed when the
/// member map becomes empty.
pub struct RoomState {
    /// Presence roster keyed by connection id.
    pub members: HashMap<Uuid, Member>,
    /// Connected clients: connection id → sender for outgoing events.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerEvent>>,
    /// Ordered message history, bounded by `MAX_HISTORY`.
    pub history: VecDeque<ChatMessage>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self { members: HashMap::new(), clients: HashMap::new(), history: VecDeque::new() }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum — both stores are
/// Arc-wrapped. Lock order is always sessions before rooms.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Seed a session plus matching room membership for one connection,
    /// returning the connection id and the receiving end of its channel.
    pub async fn seed_joined_user(
        state: &AppState,
        room_name: &str,
        username: &str,
    ) -> (Uuid, mpsc::Receiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(32);
        let color = "#FF6B6B".to_string();

        let mut sessions = state.sessions.write().await;
        sessions.insert(
            conn_id,
            Session { username: username.into(), room: room_name.into(), color: color.clone() },
        );

        let mut rooms = state.rooms.write().await;
        let room = rooms.entry(room_name.to_string()).or_default();
        room.members.insert(conn_id, Member { username: username.into(), color });
        room.clients.insert(conn_id, tx);

        (conn_id, rx)
    }

    /// Create a dummy stored message.
    #[must_use]
    pub fn dummy_message(username: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            username: username.into(),
            color: "#4ECDC4".into(),
            text: text.into(),
            timestamp: "10:00:00".into(),
            reactions: Reactions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_state_new_is_empty() {
        let room = RoomState::new();
        assert!(room.members.is_empty());
        assert!(room.clients.is_empty());
        assert!(room.history.is_empty());
    }

    #[test]
    fn chat_message_serde_round_trip() {
        let msg = test_helpers::dummy_message("alice", "hello");
        let json = serde_json::to_string(&msg).expect("encode");
        let restored: ChatMessage = serde_json::from_str(&json).expect("decode");
        assert_eq!(restored, msg);
    }

    #[tokio::test]
    async fn seeded_user_mirrors_session_and_membership() {
        let state = AppState::new();
        let (conn_id, _rx) = test_helpers::seed_joined_user(&state, "general", "alice").await;

        let sessions = state.sessions.read().await;
        let rooms = state.rooms.read().await;
        let session = sessions.get(&conn_id).expect("session should exist");
        let room = rooms.get("general").expect("room should exist");
        assert_eq!(session.room, "general");
        assert!(room.members.contains_key(&conn_id));
        assert!(room.clients.contains_key(&conn_id));
    }
}
