//! chatrelay — room-based chat relay over WebSockets.
//!
//! ARCHITECTURE
//! ============
//! - `state`: shared in-memory stores (sessions, rooms) behind `RwLock`s
//! - `event`: the JSON wire protocol (client and server event enums)
//! - `services`: domain logic as free functions over `AppState`
//! - `routes`: router assembly and the websocket connection handler
//!
//! All state is process-local and in-memory; nothing survives a restart.

mod event;
mod routes;
mod services;
mod state;

use std::path::PathBuf;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let static_dir: PathBuf =
        std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()).into();

    let state = AppState::new();
    let app = routes::app(state, static_dir);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(%addr, "chatrelay listening");
    axum::serve(listener, app).await.expect("server error");
}
