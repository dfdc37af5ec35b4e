//! Wire message taxonomy.
//!
//! Every JSON object exchanged with the relay is one of these kinds,
//! discriminated by its `type` field. Modeling them as a single enum keeps
//! the matching exhaustive: adding a kind forces every consumer to handle
//! it instead of silently falling through a string comparison.
//!
//! Field names follow the relay's camelCase JSON. Edge identifiers cross
//! the wire as string tokens (`h-0-0`) and are parsed into structured
//! [`EdgeId`](super::board::EdgeId) keys at this boundary only.

use serde::{Deserialize, Serialize};

use super::board::EdgeId;
use super::game::Slot;
use super::session::HandshakeResult;

/// One lobby roster entry carried by a `presence` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUser {
    pub user_id: String,
    pub display_name: String,
}

/// A message exchanged with the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Authoritative edge claim, applied by every replica in arrival order.
    #[serde(rename = "move", rename_all = "camelCase")]
    Move {
        game_id: String,
        edge_id: String,
        player_slot: Slot,
    },

    /// Explicit early termination by a participant.
    #[serde(rename = "endGame", rename_all = "camelCase")]
    EndGame { game_id: String, text: String },

    /// Session handshake: the ordered participant pair fixes the slots.
    #[serde(rename = "startGame", rename_all = "camelCase")]
    StartGame {
        game_id: String,
        player_ids: [String; 2],
    },

    /// Chat line; no effect on game state. `game_id` is absent for lobby
    /// chat and set for in-game chat.
    #[serde(rename = "chat", rename_all = "camelCase")]
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        text: String,
        user_id: String,
        display_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sent_at: Option<chrono::DateTime<chrono::Utc>>,
    },

    /// Lobby roster snapshot.
    #[serde(rename = "presence")]
    Presence { users: Vec<PresenceUser> },

    /// Outbound challenge request (client to relay).
    #[serde(rename = "challenge", rename_all = "camelCase")]
    Challenge { target_user_id: String },

    /// A challenge relayed to the lobby.
    #[serde(rename = "challengeOffer", rename_all = "camelCase")]
    ChallengeOffer {
        from_user_id: String,
        from_name: String,
        target_user_id: String,
    },

    /// Challenge acceptance; matchmaking answers with `startGame`.
    #[serde(rename = "challengeAccept", rename_all = "camelCase")]
    ChallengeAccept { opponent_user_id: String },
}

impl Message {
    /// Parse a raw relay frame. Malformed frames are errors the caller
    /// drops; they are never fatal.
    pub fn from_json(raw: &str) -> Result<Message, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Marshal for transmission.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The session this message belongs to, if it is session-scoped.
    pub fn game_id(&self) -> Option<&str> {
        match self {
            Self::Move { game_id, .. }
            | Self::EndGame { game_id, .. }
            | Self::StartGame { game_id, .. } => Some(game_id),
            Self::Chat { game_id, .. } => game_id.as_deref(),
            Self::Presence { .. }
            | Self::Challenge { .. }
            | Self::ChallengeOffer { .. }
            | Self::ChallengeAccept { .. } => None,
        }
    }

    /// Build an outbound move, marshaling the edge to its wire token.
    pub fn new_move(game_id: String, edge: EdgeId, slot: Slot) -> Message {
        Self::Move {
            game_id,
            edge_id: edge.to_string(),
            player_slot: slot,
        }
    }

    /// Build an outbound termination notice.
    pub fn new_end_game(game_id: String, text: String) -> Message {
        Self::EndGame { game_id, text }
    }

    /// Build an outbound chat line, stamped with the current time.
    pub fn new_chat(
        game_id: Option<String>,
        user_id: String,
        display_name: String,
        text: String,
    ) -> Message {
        Self::Chat {
            game_id,
            text,
            user_id,
            display_name,
            sent_at: Some(chrono::Utc::now()),
        }
    }

    /// View a `startGame` message as a handshake.
    pub fn handshake(&self) -> Option<HandshakeResult> {
        match self {
            Self::StartGame {
                game_id,
                player_ids,
            } => Some(HandshakeResult::new(game_id.clone(), player_ids.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let raw = r#"{"type":"move","gameId":"game-1","edgeId":"h-0-0","playerSlot":"p1"}"#;
        let msg = Message::from_json(raw).unwrap();
        assert_eq!(
            msg,
            Message::Move {
                game_id: "game-1".to_string(),
                edge_id: "h-0-0".to_string(),
                player_slot: Slot::One,
            }
        );
        assert_eq!(msg.game_id(), Some("game-1"));
    }

    #[test]
    fn test_move_round_trip() {
        let msg = Message::new_move("game-1".to_string(), "v-2-3".parse().unwrap(), Slot::Two);
        let raw = msg.to_json().unwrap();
        assert!(raw.contains(r#""type":"move""#));
        assert!(raw.contains(r#""edgeId":"v-2-3""#));
        assert!(raw.contains(r#""playerSlot":"p2""#));
        assert_eq!(Message::from_json(&raw).unwrap(), msg);
    }

    #[test]
    fn test_parse_start_game() {
        let raw = r#"{"type":"startGame","gameId":"game-7","playerIds":["u42","u7"]}"#;
        let msg = Message::from_json(raw).unwrap();

        let handshake = msg.handshake().unwrap();
        assert_eq!(handshake.session_id, "game-7");
        assert_eq!(handshake.resolve_slot("u7"), Some(Slot::Two));
    }

    #[test]
    fn test_start_game_requires_exactly_two_players() {
        let raw = r#"{"type":"startGame","gameId":"g","playerIds":["a"]}"#;
        assert!(Message::from_json(raw).is_err());

        let raw = r#"{"type":"startGame","gameId":"g","playerIds":["a","b","c"]}"#;
        assert!(Message::from_json(raw).is_err());
    }

    #[test]
    fn test_parse_end_game() {
        let raw = r#"{"type":"endGame","gameId":"game-1","text":"Game ended by a player"}"#;
        let msg = Message::from_json(raw).unwrap();
        assert_eq!(
            msg,
            Message::new_end_game("game-1".to_string(), "Game ended by a player".to_string())
        );
    }

    #[test]
    fn test_parse_lobby_and_game_chat() {
        let raw = r#"{"type":"chat","text":"hi","userId":"u42","displayName":"Alice"}"#;
        let msg = Message::from_json(raw).unwrap();
        assert_eq!(msg.game_id(), None);

        let raw = r#"{"type":"chat","gameId":"game-1","text":"gg","userId":"u7","displayName":"Bob","sentAt":"2026-08-06T10:00:00Z"}"#;
        let msg = Message::from_json(raw).unwrap();
        assert_eq!(msg.game_id(), Some("game-1"));
    }

    #[test]
    fn test_parse_presence() {
        let raw = r#"{"type":"presence","users":[{"userId":"u42","displayName":"Alice"}]}"#;
        let msg = Message::from_json(raw).unwrap();
        match msg {
            Message::Presence { users } => {
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].user_id, "u42");
                assert_eq!(users[0].display_name, "Alice");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_challenge_flow() {
        let raw = r#"{"type":"challenge","targetUserId":"u7"}"#;
        assert_eq!(
            Message::from_json(raw).unwrap(),
            Message::Challenge {
                target_user_id: "u7".to_string()
            }
        );

        let raw =
            r#"{"type":"challengeOffer","fromUserId":"u42","fromName":"Alice","targetUserId":"u7"}"#;
        assert!(Message::from_json(raw).is_ok());

        let raw = r#"{"type":"challengeAccept","opponentUserId":"u42"}"#;
        assert_eq!(
            Message::from_json(raw).unwrap(),
            Message::ChallengeAccept {
                opponent_user_id: "u42".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_frames_are_errors() {
        for raw in [
            "",
            "not json",
            r#"{"gameId":"g"}"#,
            r#"{"type":"unknown","gameId":"g"}"#,
            r#"{"type":"move","gameId":"g"}"#,
            r#"{"type":"move","gameId":"g","edgeId":"h-0-0","playerSlot":"p3"}"#,
        ] {
            assert!(Message::from_json(raw).is_err(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_chat_stamps_time() {
        let msg = Message::new_chat(
            Some("game-1".to_string()),
            "u42".to_string(),
            "Alice".to_string(),
            "hello".to_string(),
        );
        match msg {
            Message::Chat { sent_at, .. } => assert!(sent_at.is_some()),
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
