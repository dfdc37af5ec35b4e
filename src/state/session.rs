//! Session handshake and slot assignment.
//!
//! A session starts when matchmaking emits a `startGame` event carrying
//! the session ID and an ordered pair of participant identities. Each
//! replica looks for its own identity in that pair; the index it finds is
//! its [`Slot`] for the whole session. A replica whose identity is absent
//! is simply not a participant and should navigate away.
//!
//! The resolved slot is persisted through a [`SlotStore`] keyed by session
//! ID, so a reload or reconnect recovers the same slot without re-running
//! the handshake.

use std::collections::HashMap;

use super::game::Slot;

/// The outcome of the handshake: a session and its two participants in
/// slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResult {
    pub session_id: String,
    /// Participant identities; index is the assigned slot.
    pub player_ids: [String; 2],
}

impl HandshakeResult {
    pub fn new(session_id: impl Into<String>, player_ids: [String; 2]) -> Self {
        Self {
            session_id: session_id.into(),
            player_ids,
        }
    }

    /// Find the slot assigned to an identity, if it participates.
    pub fn resolve_slot(&self, identity: &str) -> Option<Slot> {
        self.player_ids
            .iter()
            .position(|id| id == identity)
            .and_then(Slot::from_index)
    }

    /// Resolve the local identity and persist the association for
    /// reconnect recovery.
    pub fn join(&self, identity: &str, store: &mut dyn SlotStore) -> JoinOutcome {
        match self.resolve_slot(identity) {
            Some(slot) => {
                store.set(&self.session_id, slot);
                JoinOutcome::Joined(slot)
            }
            None => JoinOutcome::NotParticipant,
        }
    }
}

/// How a replica entered (or failed to enter) a session.
///
/// `NotParticipant` is a navigation outcome, not an error: the handshake
/// was well-formed, it just names two other people.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(Slot),
    NotParticipant,
}

impl JoinOutcome {
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Self::Joined(slot) => Some(*slot),
            Self::NotParticipant => None,
        }
    }
}

/// Narrow contract over whatever durable key-value store the client has
/// (browser local storage, a settings file, plain memory in tests).
///
/// Only the `session ID → assigned slot` association is persisted; the
/// game state itself is rebuilt by replaying the move stream.
pub trait SlotStore {
    fn get(&self, session_id: &str) -> Option<Slot>;
    fn set(&mut self, session_id: &str, slot: Slot);
    fn clear(&mut self, session_id: &str);
}

/// In-memory slot store.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: HashMap<String, Slot>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, session_id: &str) -> Option<Slot> {
        self.slots.get(session_id).copied()
    }

    fn set(&mut self, session_id: &str, slot: Slot) {
        self.slots.insert(session_id.to_string(), slot);
    }

    fn clear(&mut self, session_id: &str) {
        self.slots.remove(session_id);
    }
}
