//! DotBox State Library
//!
//! This crate provides replicated state management for DotBox, a
//! two-player dots-and-boxes game whose participants stay in sync by
//! applying the same relayed event stream instead of sharing memory.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Board Topology** - Pure edge/box layout and adjacency for a dots
//!   grid; no state.
//!
//! - **Game State Machine** - One atomic, idempotent `apply` per move:
//!   edge claims, cascading box completion, scoring, bonus turns, win and
//!   draw detection.
//!
//! - **Session Handshake** - Resolves the ordered participant pair from
//!   matchmaking into the two fixed slots, with persisted associations
//!   for reconnect recovery.
//!
//! - **Replica Driver** - Routes the relay's message stream (moves,
//!   terminations, chat, matchmaking) through each session's replica, one
//!   event at a time.
//!
//! # Design Principles
//!
//! 1. **The stream is the truth** - State only changes when an event
//!    arrives through the relay's ordered stream; local submissions are
//!    gated for UX but never applied directly.
//!
//! 2. **Anomalies degrade to no-ops** - Duplicate, foreign, stale or
//!    malformed input never corrupts state and never aborts a session.
//!
//! 3. **No networking** - This crate is pure state, no WebSocket or HTTP.
//!
//! 4. **Serialization-ready** - Wire messages are typed and exhaustive;
//!    snapshots convert to JSON for clients.
//!
//! # Example
//!
//! ```rust
//! use dotbox_state::state::{ClientState, Message, ReplicaEvent, Slot};
//!
//! let mut client = ClientState::new("u7".to_string());
//!
//! // Matchmaking fixes the slots: index in the pair is the slot.
//! let start = Message::StartGame {
//!     game_id: "game-1".to_string(),
//!     player_ids: ["u42".to_string(), "u7".to_string()],
//! };
//! assert_eq!(client.handle_message(start), ReplicaEvent::Joined(Slot::Two));
//!
//! // Moves take effect only as they arrive through the ordered stream.
//! let first = Message::Move {
//!     game_id: "game-1".to_string(),
//!     edge_id: "h-0-0".to_string(),
//!     player_slot: Slot::One,
//! };
//! assert!(matches!(client.handle_message(first), ReplicaEvent::Move(_)));
//!
//! // That move closed nothing, so the turn passed to this client.
//! let replica = client.replica_mut("game-1").unwrap();
//! let outbound = replica.submit("v-0-0".parse().unwrap(), true).unwrap();
//! assert_eq!(outbound.game_id(), Some("game-1"));
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
