//! Per-session replica driver.
//!
//! A [`Replica`] is one client's copy of one session. It owns that
//! session's game state exclusively and processes inbound relay messages
//! one at a time, end to end, so the claim → completion → score/turn/
//! status cascade is always observed as a single step. Replicas for
//! different sessions share nothing and may be driven independently.
//!
//! The replica trusts the relay's ordering: every participant receives
//! the same messages in the same order, so every replica converges on the
//! same state. Anything it cannot use (foreign session, malformed edge
//! token, events after the end) is dropped without effect.

use super::board::{Board, EdgeId};
use super::game::{ApplyOutcome, Game, GameStatus, MoveEvent, Slot};
use super::gate::{check_submission, Notice, NoticeBoard, SubmitBlocked};
use super::lifecycle::{EndKind, Lifecycle, PhaseEvent, SessionPhase};
use super::session::{HandshakeResult, JoinOutcome, SlotStore};
use super::wire::Message;

/// Why an inbound message was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The message belongs to a different session
    ForeignSession,
    /// A session-scoped message arrived before any game exists here
    NoActiveGame,
    /// The edge token did not parse
    BadEdgeToken,
    /// The session already ended
    SessionOver,
    /// No replica exists for the session and no stored slot to resume from
    UnknownSession,
}

/// What the host should surface after one inbound message is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicaEvent {
    /// Handshake resolved; this client plays `Slot`.
    Joined(Slot),
    /// The handshake names two other people; leave the session context.
    NotParticipant,
    /// A move went through the state machine (applied or ignored).
    Move(ApplyOutcome),
    /// A participant ended the session early.
    Aborted { text: String },
    /// No core state effect; hand the message to the UI as-is.
    PassThrough(Message),
    /// Dropped without effect.
    Dropped(DropReason),
}

/// One session's single-writer apply loop state.
#[derive(Debug)]
pub struct Replica {
    session_id: String,
    /// This client's stable identity, matched against handshake pairs
    identity: String,
    board: Board,
    lifecycle: Lifecycle,
    slot: Option<Slot>,
    game: Option<Game>,
    notices: NoticeBoard,
}

impl Replica {
    /// Create a replica awaiting its handshake.
    pub fn new(session_id: String, identity: String) -> Self {
        Self::with_board(session_id, identity, Board::default())
    }

    pub fn with_board(session_id: String, identity: String, board: Board) -> Self {
        Self {
            session_id,
            identity,
            board,
            lifecycle: Lifecycle::new(),
            slot: None,
            game: None,
            notices: NoticeBoard::new(),
        }
    }

    /// Recover a replica from a persisted slot association instead of a
    /// fresh handshake (page reload, reconnect). Returns `None` when the
    /// store has no slot for this session; the caller should navigate
    /// away. The game starts empty and is rebuilt by the relay's replay
    /// of the move stream.
    pub fn resume(
        session_id: String,
        identity: String,
        board: Board,
        store: &dyn SlotStore,
    ) -> Option<Self> {
        let slot = store.get(&session_id)?;
        let mut replica = Self::with_board(session_id, identity, board);
        replica.slot = Some(slot);
        replica.game = Some(Game::new(replica.session_id.clone(), board));
        let _ = replica.lifecycle.apply_mut(PhaseEvent::Begin);
        Some(replica)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// This replica's slot, once joined.
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    pub fn phase(&self) -> SessionPhase {
        self.lifecycle.phase()
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// Process one inbound relay message, end to end.
    pub fn handle(&mut self, msg: Message, store: &mut dyn SlotStore) -> ReplicaEvent {
        if let Some(game_id) = msg.game_id() {
            if game_id != self.session_id {
                tracing::debug!(
                    session = %self.session_id,
                    foreign = %game_id,
                    "message for another session dropped"
                );
                return ReplicaEvent::Dropped(DropReason::ForeignSession);
            }
        }

        match msg {
            Message::StartGame {
                game_id,
                player_ids,
            } => self.handle_start(HandshakeResult::new(game_id, player_ids), store),

            Message::Move {
                edge_id,
                player_slot,
                ..
            } => self.handle_move(&edge_id, player_slot),

            Message::EndGame { text, .. } => self.handle_end(text),

            // No core state effect; surfaced for display.
            msg @ (Message::Chat { .. }
            | Message::Presence { .. }
            | Message::Challenge { .. }
            | Message::ChallengeOffer { .. }
            | Message::ChallengeAccept { .. }) => ReplicaEvent::PassThrough(msg),
        }
    }

    fn handle_start(
        &mut self,
        handshake: HandshakeResult,
        store: &mut dyn SlotStore,
    ) -> ReplicaEvent {
        if self.lifecycle.is_terminal() {
            return ReplicaEvent::Dropped(DropReason::SessionOver);
        }

        match handshake.join(&self.identity, store) {
            JoinOutcome::Joined(slot) => {
                self.slot = Some(slot);
                // A replayed handshake must not wipe an in-progress game.
                if self.game.is_none() {
                    self.game = Some(Game::new(self.session_id.clone(), self.board));
                }
                if !self.lifecycle.is_active() {
                    let _ = self.lifecycle.apply_mut(PhaseEvent::Begin);
                }
                tracing::debug!(session = %self.session_id, slot = %slot, "joined session");
                ReplicaEvent::Joined(slot)
            }
            JoinOutcome::NotParticipant => {
                tracing::debug!(session = %self.session_id, "handshake does not include local identity");
                ReplicaEvent::NotParticipant
            }
        }
    }

    fn handle_move(&mut self, edge_token: &str, slot: Slot) -> ReplicaEvent {
        let Some(game) = self.game.as_mut() else {
            tracing::debug!(session = %self.session_id, "move before handshake dropped");
            return ReplicaEvent::Dropped(DropReason::NoActiveGame);
        };

        let edge: EdgeId = match edge_token.parse() {
            Ok(edge) => edge,
            Err(err) => {
                tracing::warn!(session = %self.session_id, %err, "move with bad edge token dropped");
                return ReplicaEvent::Dropped(DropReason::BadEdgeToken);
            }
        };

        let outcome = game.apply(MoveEvent::new(edge, slot));

        // The lifecycle observes terminal statuses the state machine
        // reaches on its own.
        if let ApplyOutcome::Applied { status, .. } = &outcome {
            let end = match status {
                GameStatus::Won(winner) => Some(EndKind::Won(*winner)),
                GameStatus::Draw => Some(EndKind::Draw),
                GameStatus::InProgress | GameStatus::Aborted => None,
            };
            if let Some(kind) = end {
                let _ = self.lifecycle.apply_mut(PhaseEvent::Finish(kind));
            }
        }

        ReplicaEvent::Move(outcome)
    }

    fn handle_end(&mut self, text: String) -> ReplicaEvent {
        if self.lifecycle.is_terminal() {
            return ReplicaEvent::Dropped(DropReason::SessionOver);
        }

        if let Some(game) = self.game.as_mut() {
            game.abort();
        }
        let _ = self.lifecycle.apply_mut(PhaseEvent::Abort);
        tracing::debug!(session = %self.session_id, "session aborted");
        ReplicaEvent::Aborted { text }
    }

    /// Gate and build a candidate move for transmission.
    ///
    /// On success the returned message goes to the relay; local state does
    /// not change until the move comes back through the ordered stream.
    /// On failure the attempt is dropped with a transient notice.
    pub fn submit(&mut self, edge: EdgeId, channel_open: bool) -> Result<Message, SubmitBlocked> {
        let gated = match (self.slot, self.game.as_ref()) {
            (Some(slot), Some(game)) => {
                check_submission(game, slot, channel_open).map(|()| slot)
            }
            _ => Err(SubmitBlocked::NotJoined),
        };

        match gated {
            Ok(slot) => Ok(Message::new_move(self.session_id.clone(), edge, slot)),
            Err(blocked) => {
                tracing::debug!(session = %self.session_id, %blocked, "submission blocked");
                self.notices.push(Notice::from(blocked));
                Err(blocked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::state::game::IgnoreReason;
    use crate::state::session::MemorySlotStore;

    fn start_msg() -> Message {
        Message::StartGame {
            game_id: "game-1".to_string(),
            player_ids: ["u42".to_string(), "u7".to_string()],
        }
    }

    fn move_msg(edge: &str, slot: Slot) -> Message {
        Message::Move {
            game_id: "game-1".to_string(),
            edge_id: edge.to_string(),
            player_slot: slot,
        }
    }

    fn joined_replica() -> (Replica, MemorySlotStore) {
        let mut store = MemorySlotStore::new();
        let mut replica = Replica::new("game-1".to_string(), "u42".to_string());
        assert_eq!(
            replica.handle(start_msg(), &mut store),
            ReplicaEvent::Joined(Slot::One)
        );
        (replica, store)
    }

    #[test]
    fn test_handshake_joins_and_persists() {
        let (replica, store) = joined_replica();

        assert_eq!(replica.slot(), Some(Slot::One));
        assert_eq!(replica.phase(), SessionPhase::Active);
        assert!(replica.game().is_some());
        assert_eq!(store.get("game-1"), Some(Slot::One));
    }

    #[test]
    fn test_handshake_for_outsider_redirects() {
        let mut store = MemorySlotStore::new();
        let mut replica = Replica::new("game-1".to_string(), "u99".to_string());

        assert_eq!(
            replica.handle(start_msg(), &mut store),
            ReplicaEvent::NotParticipant
        );
        assert_eq!(replica.slot(), None);
        assert_eq!(replica.phase(), SessionPhase::Pending);
        assert_eq!(store.get("game-1"), None);
    }

    #[test]
    fn test_replayed_handshake_keeps_game_state() {
        let (mut replica, mut store) = joined_replica();
        replica.handle(move_msg("h-0-0", Slot::One), &mut store);

        // Reconnect replay delivers startGame again.
        assert_eq!(
            replica.handle(start_msg(), &mut store),
            ReplicaEvent::Joined(Slot::One)
        );
        let game = replica.game().unwrap();
        assert_eq!(game.claimed_edge_count(), 1);
    }

    #[test]
    fn test_move_applies_and_flips_turn() {
        let (mut replica, mut store) = joined_replica();

        let event = replica.handle(move_msg("h-0-0", Slot::One), &mut store);
        assert_eq!(
            event,
            ReplicaEvent::Move(ApplyOutcome::Applied {
                completed: vec![],
                next_turn: Slot::Two,
                status: GameStatus::InProgress,
            })
        );
    }

    #[test]
    fn test_replayed_moves_are_idempotent() {
        let (mut replica, mut store) = joined_replica();

        replica.handle(move_msg("h-0-0", Slot::One), &mut store);
        let event = replica.handle(move_msg("h-0-0", Slot::One), &mut store);
        assert_eq!(
            event,
            ReplicaEvent::Move(ApplyOutcome::Ignored(IgnoreReason::AlreadyClaimed))
        );
    }

    #[test]
    fn test_foreign_session_messages_dropped() {
        let (mut replica, mut store) = joined_replica();

        let foreign = Message::Move {
            game_id: "game-2".to_string(),
            edge_id: "h-0-0".to_string(),
            player_slot: Slot::One,
        };
        assert_eq!(
            replica.handle(foreign, &mut store),
            ReplicaEvent::Dropped(DropReason::ForeignSession)
        );
        assert_eq!(replica.game().unwrap().claimed_edge_count(), 0);
    }

    #[test]
    fn test_move_before_handshake_dropped() {
        let mut store = MemorySlotStore::new();
        let mut replica = Replica::new("game-1".to_string(), "u42".to_string());

        assert_eq!(
            replica.handle(move_msg("h-0-0", Slot::One), &mut store),
            ReplicaEvent::Dropped(DropReason::NoActiveGame)
        );
    }

    #[test]
    fn test_bad_edge_token_dropped() {
        let (mut replica, mut store) = joined_replica();

        assert_eq!(
            replica.handle(move_msg("nonsense", Slot::One), &mut store),
            ReplicaEvent::Dropped(DropReason::BadEdgeToken)
        );
        assert_eq!(replica.game().unwrap().claimed_edge_count(), 0);
    }

    #[test]
    fn test_end_game_aborts_session() {
        let (mut replica, mut store) = joined_replica();

        let event = replica.handle(
            Message::EndGame {
                game_id: "game-1".to_string(),
                text: "Opponent left".to_string(),
            },
            &mut store,
        );
        assert_eq!(
            event,
            ReplicaEvent::Aborted {
                text: "Opponent left".to_string()
            }
        );
        assert_eq!(replica.phase(), SessionPhase::Aborted);
        assert_eq!(replica.game().unwrap().status, GameStatus::Aborted);

        // Everything after the end is a no-op.
        assert_eq!(
            replica.handle(move_msg("h-0-0", Slot::One), &mut store),
            ReplicaEvent::Move(ApplyOutcome::Ignored(IgnoreReason::GameOver))
        );
        assert_eq!(
            replica.handle(
                Message::EndGame {
                    game_id: "game-1".to_string(),
                    text: "again".to_string()
                },
                &mut store
            ),
            ReplicaEvent::Dropped(DropReason::SessionOver)
        );
    }

    #[test]
    fn test_chat_passes_through() {
        let (mut replica, mut store) = joined_replica();

        let chat = Message::new_chat(
            Some("game-1".to_string()),
            "u7".to_string(),
            "Bob".to_string(),
            "gg".to_string(),
        );
        assert_eq!(
            replica.handle(chat.clone(), &mut store),
            ReplicaEvent::PassThrough(chat)
        );
        assert_eq!(replica.game().unwrap().claimed_edge_count(), 0);
    }

    #[test]
    fn test_submit_happy_path() {
        let (mut replica, _) = joined_replica();

        let msg = replica.submit("h-0-0".parse().unwrap(), true).unwrap();
        assert_eq!(
            msg,
            Message::Move {
                game_id: "game-1".to_string(),
                edge_id: "h-0-0".to_string(),
                player_slot: Slot::One,
            }
        );
        // Submission alone does not change local state.
        assert_eq!(replica.game().unwrap().claimed_edge_count(), 0);
    }

    #[test]
    fn test_submit_blocked_off_turn_leaves_notice() {
        let (mut replica, mut store) = joined_replica();
        replica.handle(move_msg("h-0-0", Slot::One), &mut store);

        // Turn is now slot two; this replica holds slot one.
        let result = replica.submit("h-0-1".parse().unwrap(), true);
        assert_eq!(result, Err(SubmitBlocked::NotYourTurn));
        assert_eq!(replica.notices().len(), 1);
    }

    #[test]
    fn test_submit_blocked_before_join() {
        let mut replica = Replica::new("game-1".to_string(), "u42".to_string());
        let result = replica.submit("h-0-0".parse().unwrap(), true);
        assert_eq!(result, Err(SubmitBlocked::NotJoined));
    }

    #[test]
    fn test_submit_blocked_when_channel_closed() {
        let (mut replica, _) = joined_replica();
        let result = replica.submit("h-0-0".parse().unwrap(), false);
        assert_eq!(result, Err(SubmitBlocked::ChannelClosed));
    }

    #[test]
    fn test_resume_recovers_slot_without_handshake() {
        let mut store = MemorySlotStore::new();
        store.set("game-1", Slot::Two);

        let mut replica = Replica::resume(
            "game-1".to_string(),
            "u7".to_string(),
            Board::default(),
            &store,
        )
        .unwrap();
        assert_eq!(replica.slot(), Some(Slot::Two));
        assert_eq!(replica.phase(), SessionPhase::Active);

        // Replayed stream rebuilds the board state.
        replica.handle(move_msg("h-0-0", Slot::One), &mut store);
        replica.handle(move_msg("v-0-0", Slot::Two), &mut store);
        assert_eq!(replica.game().unwrap().claimed_edge_count(), 2);
    }

    #[test]
    fn test_resume_without_stored_slot_fails() {
        let store = MemorySlotStore::new();
        assert!(Replica::resume(
            "game-1".to_string(),
            "u7".to_string(),
            Board::default(),
            &store,
        )
        .is_none());
    }

    #[test]
    fn test_natural_end_completes_lifecycle() {
        let (mut replica, mut store) = joined_replica();

        // Hand the whole board to slot one: rim and walls first, then the
        // closing bottoms (mirrors the state machine's own tests).
        let board = replica.game().unwrap().board();
        let walls: Vec<String> = (0..board.boxes_x())
            .map(|col| format!("h-0-{}", col))
            .chain((0..board.boxes_y()).flat_map(|row| {
                (0..=board.boxes_x()).map(move |col| format!("v-{}-{}", row, col))
            }))
            .collect();
        for token in walls {
            replica.handle(move_msg(&token, Slot::One), &mut store);
        }
        for row in 0..board.boxes_y() {
            for col in 0..board.boxes_x() {
                replica.handle(move_msg(&format!("h-{}-{}", row + 1, col), Slot::One), &mut store);
            }
        }

        assert_eq!(
            replica.phase(),
            SessionPhase::Completed(EndKind::Won(Slot::One))
        );
        assert_eq!(replica.game().unwrap().status, GameStatus::Won(Slot::One));
    }
}
