//! State management module for DotBox.
//!
//! This module provides the core state types and drivers:
//!
//! - `board` - Board topology (edges, boxes, adjacency)
//! - `game` - Replicated game state machine and manager
//! - `gate` - Advisory move-submission gate and transient notices
//! - `session` - Handshake, slot assignment, slot persistence
//! - `lifecycle` - Session phase machine
//! - `wire` - Relay message taxonomy
//! - `replica` - Per-session event-application driver
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ClientState                          │
//! │                                                              │
//! │   ┌──────────────────┐      ┌──────────────────────────┐     │
//! │   │ MemorySlotStore  │      │  Replica (per session)   │     │
//! │   │                  │      │                          │     │
//! │   │ session_id →     │      │  Lifecycle phase         │     │
//! │   │   Slot           │      │  Slot (mine)             │     │
//! │   └──────────────────┘      │  Game (edges, boxes,     │     │
//! │                             │        turn, scores)     │     │
//! │                             │  NoticeBoard             │     │
//! │                             └──────────────────────────┘     │
//! │                                                              │
//! │   inbound Message ──route by gameId──▶ Replica::handle       │
//! │   Replica::submit(edge) ──gate──▶ outbound Message ──▶ relay │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every replica of one session receives the identical message stream in
//! the identical order from the relay, applies it through the same state
//! machine, and therefore converges on the same edges, boxes, turn,
//! scores and status without any shared memory.

pub mod board;
pub mod game;
pub mod gate;
pub mod lifecycle;
pub mod replica;
pub mod session;
pub mod wire;

// Re-export commonly used types
pub use board::{Board, BoxId, EdgeId, Orientation, ParseIdError, DEFAULT_BOXES_X, DEFAULT_BOXES_Y};
pub use game::{ApplyOutcome, Game, GameManager, GameStatus, IgnoreReason, MoveEvent, Slot};
pub use gate::{check_submission, Notice, NoticeBoard, SubmitBlocked, DEFAULT_NOTICE_TTL};
pub use lifecycle::{EndKind, InvalidPhase, Lifecycle, PhaseEvent, SessionPhase};
pub use replica::{DropReason, Replica, ReplicaEvent};
pub use session::{HandshakeResult, JoinOutcome, MemorySlotStore, SlotStore};
pub use wire::{Message, PresenceUser};

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Combined client-side state.
///
/// An optional convenience that owns every session replica plus the
/// shared slot store and routes inbound relay messages to the right
/// session. Hosts that manage replicas themselves can use [`Replica`]
/// directly.
#[derive(Debug)]
pub struct ClientState {
    /// This client's stable identity
    pub identity: String,

    /// Session replicas by session ID
    replicas: HashMap<String, Replica>,

    /// Slot persistence shared by all sessions of this client
    pub slots: MemorySlotStore,

    /// Board dimensions for new sessions
    board: Board,
}

impl ClientState {
    pub fn new(identity: String) -> Self {
        Self::with_board(identity, Board::default())
    }

    pub fn with_board(identity: String, board: Board) -> Self {
        Self {
            identity,
            replicas: HashMap::new(),
            slots: MemorySlotStore::new(),
            board,
        }
    }

    /// Get a session replica.
    pub fn replica(&self, session_id: &str) -> Option<&Replica> {
        self.replicas.get(session_id)
    }

    /// Get a mutable session replica.
    pub fn replica_mut(&mut self, session_id: &str) -> Option<&mut Replica> {
        self.replicas.get_mut(session_id)
    }

    /// Count tracked sessions.
    pub fn session_count(&self) -> usize {
        self.replicas.len()
    }

    /// Route one inbound relay message.
    ///
    /// Session-scoped messages go to their session's replica. A
    /// `startGame` for a new session creates its replica; any other
    /// message for an untracked session is resumed from the slot store
    /// when possible (reconnect replay) and dropped otherwise. Messages
    /// without a session scope pass through for the host to display.
    pub fn handle_message(&mut self, msg: Message) -> ReplicaEvent {
        let Some(session_id) = msg.game_id().map(str::to_string) else {
            return ReplicaEvent::PassThrough(msg);
        };

        let replica = match self.replicas.entry(session_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let fresh = if matches!(msg, Message::StartGame { .. }) {
                    Some(Replica::with_board(
                        session_id.clone(),
                        self.identity.clone(),
                        self.board,
                    ))
                } else {
                    Replica::resume(
                        session_id.clone(),
                        self.identity.clone(),
                        self.board,
                        &self.slots,
                    )
                };
                match fresh {
                    Some(replica) => entry.insert(replica),
                    None => {
                        tracing::debug!(session = %session_id, "message for unknown session dropped");
                        return ReplicaEvent::Dropped(DropReason::UnknownSession);
                    }
                }
            }
        };

        let event = replica.handle(msg, &mut self.slots);

        // A handshake naming two other people leaves nothing to track.
        if event == ReplicaEvent::NotParticipant {
            self.replicas.remove(&session_id);
        }
        event
    }

    /// Drop replicas whose sessions ended and forget their stored slots.
    /// Returns the retired session IDs.
    pub fn cleanup(&mut self) -> Vec<String> {
        let finished: Vec<String> = self
            .replicas
            .iter()
            .filter(|(_, r)| r.phase().is_terminal())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &finished {
            self.replicas.remove(id);
            self.slots.clear(id);
        }

        finished
    }
}
