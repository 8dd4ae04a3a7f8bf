use super::*;
use crate::services::color::PALETTE;

#[tokio::test]
async fn register_stores_session_with_palette_color() {
    let state = AppState::new();
    let conn_id = Uuid::new_v4();

    let session = register(&state, conn_id, "alice", "general").await;

    assert_eq!(session.username, "alice");
    assert_eq!(session.room, "general");
    assert!(PALETTE.contains(&session.color.as_str()));

    let stored = lookup(&state, conn_id).await.expect("session should exist");
    assert_eq!(stored.username, "alice");
    assert_eq!(stored.room, "general");
}

#[tokio::test]
async fn lookup_unknown_connection_returns_none() {
    let state = AppState::new();
    assert!(lookup(&state, Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn remove_returns_prior_session_and_clears_entry() {
    let state = AppState::new();
    let conn_id = Uuid::new_v4();
    register(&state, conn_id, "bob", "general").await;

    let removed = remove(&state, conn_id).await.expect("prior session");
    assert_eq!(removed.username, "bob");
    assert!(lookup(&state, conn_id).await.is_none());
    assert!(remove(&state, conn_id).await.is_none());
}

#[tokio::test]
async fn register_twice_overwrites_without_corrupting_state() {
    let state = AppState::new();
    let conn_id = Uuid::new_v4();
    register(&state, conn_id, "alice", "general").await;
    register(&state, conn_id, "alice2", "lobby").await;

    let sessions = state.sessions.read().await;
    assert_eq!(sessions.len(), 1);
    let session = sessions.get(&conn_id).expect("session should exist");
    assert_eq!(session.username, "alice2");
    assert_eq!(session.room, "lobby");
}
