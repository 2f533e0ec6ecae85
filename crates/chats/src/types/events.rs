//! Event types for real-time chat updates.

use serde::{Deserialize, Serialize};

use crate::entities::RenderedMessage;

/// Name under which edit notifications are delivered to clients.
pub const EDIT_EVENT: &str = "event:chats.edit";

/// Events pushed to room participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// A message was edited; carries the freshly rendered message(s).
    MessageEdited {
        room_id: String,
        messages: Vec<RenderedMessage>,
    },
}

impl ChatEvent {
    /// Transport-level event name.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::MessageEdited { .. } => EDIT_EVENT,
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            ChatEvent::MessageEdited { room_id, .. } => room_id,
        }
    }

    /// Client payload: `{ "messages": [...] }` for edits.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            ChatEvent::MessageEdited { messages, .. } => {
                serde_json::json!({ "messages": messages })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rendered() -> RenderedMessage {
        RenderedMessage {
            message_id: "m1".to_string(),
            room_id: "r1".to_string(),
            from_uid: 7,
            content: "fixed typo".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            edited_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap()),
            system: false,
            own: true,
        }
    }

    #[test]
    fn test_edit_event_name_and_payload() {
        let event = ChatEvent::MessageEdited {
            room_id: "r1".to_string(),
            messages: vec![rendered()],
        };

        assert_eq!(event.name(), "event:chats.edit");
        assert_eq!(event.room_id(), "r1");

        let payload = event.payload();
        assert_eq!(payload["messages"][0]["content"], "fixed typo");
        assert_eq!(payload["messages"][0]["fromuid"], 7);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ChatEvent::MessageEdited {
            room_id: "r1".to_string(),
            messages: vec![],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MessageEdited");
        assert_eq!(json["data"]["room_id"], "r1");
    }
}
