//! Wire protocol — the JSON events exchanged over the websocket.
//!
//! DESIGN
//! ======
//! Every frame is an envelope `{"event": <name>, "data": <payload>}`,
//! expressed here as adjacently tagged serde enums. Event names are
//! kebab-case; payload keys are camelCase where they span words. Decoding
//! is strict: an unknown event name or a missing field fails the decode,
//! and the connection handler drops the frame.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{ChatMessage, Member, Reactions};

// =============================================================================
// CLIENT → SERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Bind an identity and enter a room. Valid once per connection.
    JoinRoom { username: String, room: String },
    /// Post a message to the sender's room.
    SendMessage { text: String },
    /// Toggle an emoji reaction on a message in current history.
    AddReaction {
        #[serde(rename = "messageId")]
        message_id: Uuid,
        emoji: String,
    },
    /// Ephemeral typing indicator; the payload is a bare boolean.
    Typing(bool),
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// History snapshot, oldest first. Sent to the joiner only.
    RoomMessages(Vec<ChatMessage>),
    /// A newly posted message. Sent to the whole room, sender included.
    NewMessage(ChatMessage),
    /// Full presence roster. Sent to the whole room after any change.
    RoomUsers(Vec<Member>),
    /// Join notice. Sent to everyone except the joiner.
    UserJoined { username: String, timestamp: String },
    /// Departure notice. Sent to the remaining members.
    UserLeft { username: String, timestamp: String },
    /// Updated reaction map for one message. Sent to the whole room.
    ReactionUpdated {
        #[serde(rename = "messageId")]
        message_id: Uuid,
        reactions: Reactions,
    },
    /// Typing relay. Sent to everyone except the typist.
    UserTyping {
        username: String,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_join_room() {
        let text = r#"{"event":"join-room","data":{"username":"alice","room":"general"}}"#;
        let event: ClientEvent = serde_json::from_str(text).expect("decode");
        assert_eq!(
            event,
            ClientEvent::JoinRoom { username: "alice".into(), room: "general".into() }
        );
    }

    #[test]
    fn rejects_missing_field() {
        let text = r#"{"event":"join-room","data":{"username":"alice"}}"#;
        assert!(serde_json::from_str::<ClientEvent>(text).is_err());
    }

    #[test]
    fn rejects_unknown_event_name() {
        let text = r#"{"event":"self-destruct","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(text).is_err());
    }

    #[test]
    fn typing_payload_is_a_bare_boolean() {
        let text = r#"{"event":"typing","data":true}"#;
        let event: ClientEvent = serde_json::from_str(text).expect("decode");
        assert_eq!(event, ClientEvent::Typing(true));
    }

    #[test]
    fn add_reaction_uses_camel_case_message_id() {
        let id = Uuid::new_v4();
        let text = json!({"event": "add-reaction", "data": {"messageId": id, "emoji": "👍"}});
        let event: ClientEvent = serde_json::from_value(text).expect("decode");
        assert_eq!(event, ClientEvent::AddReaction { message_id: id, emoji: "👍".into() });
    }

    #[test]
    fn server_events_encode_expected_envelopes() {
        let typing = ServerEvent::UserTyping { username: "alice".into(), is_typing: true };
        let value = serde_json::to_value(&typing).expect("encode");
        assert_eq!(
            value,
            json!({"event": "user-typing", "data": {"username": "alice", "isTyping": true}})
        );

        let id = Uuid::new_v4();
        let update = ServerEvent::ReactionUpdated { message_id: id, reactions: Reactions::new() };
        let value = serde_json::to_value(&update).expect("encode");
        assert_eq!(value["event"], "reaction-updated");
        assert_eq!(value["data"]["messageId"], json!(id));
        assert_eq!(value["data"]["reactions"], json!({}));
    }

    #[test]
    fn server_event_round_trip() {
        let event = ServerEvent::UserJoined { username: "bob".into(), timestamp: "10:00:00".into() };
        let json = serde_json::to_string(&event).expect("encode");
        let restored: ServerEvent = serde_json::from_str(&json).expect("decode");
        assert_eq!(restored, event);
    }
}
