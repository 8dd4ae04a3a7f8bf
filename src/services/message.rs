//! Message ledger logic — construction and reaction toggling.
//!
//! DESIGN
//! ======
//! Messages are immutable after composition except for their reaction map.
//! `toggle_reaction` is the one mutation worth getting exactly right: it is
//! a toggle, not an add, and an emoji whose user set empties out is removed
//! entirely so "has anyone reacted with X" stays a pure existence check.

use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use crate::state::{ChatMessage, Reactions};

/// Compose a new message from the sender's session identity. The color is
/// snapshotted here; later session changes never rewrite history.
#[must_use]
pub fn compose(username: &str, color: &str, text: &str) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        username: username.to_string(),
        color: color.to_string(),
        text: text.to_string(),
        timestamp: clock_time(),
        reactions: Reactions::new(),
    }
}

/// Human-readable wall-clock time for message and presence notices.
#[must_use]
pub fn clock_time() -> String {
    let fmt = format_description!("[hour]:[minute]:[second]");
    OffsetDateTime::now_utc().format(&fmt).unwrap_or_default()
}

/// Toggle `username`'s reaction with `emoji`: remove it if present, add it
/// otherwise. Removes the emoji key entirely when its user set empties.
pub fn toggle_reaction(reactions: &mut Reactions, emoji: &str, username: &str) {
    let users = reactions.entry(emoji.to_string()).or_default();
    if let Some(pos) = users.iter().position(|u| u == username) {
        users.remove(pos);
    } else {
        users.push(username.to_string());
    }
    if users.is_empty() {
        reactions.remove(emoji);
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
