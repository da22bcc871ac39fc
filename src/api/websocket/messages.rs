//! Client control messages

use serde::{Deserialize, Serialize};

/// Messages a subscriber may send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Graceful close request
    Stop,

    /// Ping for heartbeat
    Ping,
}

impl ClientMessage {
    /// Parse a text frame; a bare `stop` is accepted next to the JSON form
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("stop") {
            return Some(ClientMessage::Stop);
        }
        serde_json::from_str(trimmed).ok()
    }
}

/// Pong response message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl Default for PongMessage {
    fn default() -> Self {
        Self {
            msg_type: "pong".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        assert_eq!(ClientMessage::parse("stop"), Some(ClientMessage::Stop));
        assert_eq!(ClientMessage::parse(" STOP\n"), Some(ClientMessage::Stop));
        assert_eq!(
            ClientMessage::parse(r#"{"type":"stop"}"#),
            Some(ClientMessage::Stop)
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"ping"}"#),
            Some(ClientMessage::Ping)
        );
        assert_eq!(ClientMessage::parse("hello"), None);
    }

    #[test]
    fn test_pong_serialization() {
        let json = serde_json::to_string(&PongMessage::default()).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
