//! Session registry — connection id → identity.
//!
//! DESIGN
//! ======
//! Sessions are created on join and removed on disconnect; nothing else
//! mutates them. `register` is an idempotent overwrite: a second call for
//! the same connection replaces the prior entry without corrupting the
//! registry (the route handler rejects duplicate joins before it gets
//! here, but the registry itself must stay safe either way).

use uuid::Uuid;

use crate::services::color;
use crate::state::{AppState, Session};

/// Register a session for a connection, assigning a display color from the
/// fixed palette. Returns the stored session.
pub async fn register(state: &AppState, conn_id: Uuid, username: &str, room: &str) -> Session {
    let session = Session {
        username: username.to_string(),
        room: room.to_string(),
        color: color::assign().to_string(),
    };
    let mut sessions = state.sessions.write().await;
    sessions.insert(conn_id, session.clone());
    session
}

/// Look up the session for a connection. Pure read.
pub async fn lookup(state: &AppState, conn_id: Uuid) -> Option<Session> {
    let sessions = state.sessions.read().await;
    sessions.get(&conn_id).cloned()
}

/// Remove and return the session for a connection, for use in disconnect
/// cleanup. `None` if the connection never joined.
pub async fn remove(state: &AppState, conn_id: Uuid) -> Option<Session> {
    let mut sessions = state.sessions.write().await;
    sessions.remove(&conn_id)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
