//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the room/session state transitions so the route
//! handler can stay focused on protocol translation and connection
//! lifecycle.

pub mod color;
pub mod message;
pub mod room;
pub mod session;
