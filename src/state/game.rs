//! Game state machine.
//!
//! One [`Game`] holds a single session's replicated state: edge claimants,
//! box owners, whose turn it is, scores, and terminal status. The only
//! mutating operation is [`Game::apply`], fed by the ordered move stream
//! the relay delivers to every participant. Because each replica applies
//! the identical sequence, replicas converge without a central arbiter.
//!
//! `apply` never fails: anything that cannot take effect (duplicate
//! delivery, unknown edge, move after the game ended) degrades to a no-op
//! so that replayed or foreign input cannot corrupt state.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::board::{Board, BoxId, EdgeId};

/// The two fixed participant slots of a session.
///
/// Assigned at handshake time and never reassigned. On the wire a slot is
/// `"p1"` or `"p2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "p1")]
    One,
    #[serde(rename = "p2")]
    Two,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "p1",
            Self::Two => "p2",
        }
    }

    /// The opposing slot.
    pub fn other(&self) -> Slot {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Position in the handshake's ordered participant pair.
    pub fn index(&self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Slot> {
        match index {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            _ => None,
        }
    }

    /// Fixed display color for this slot.
    pub fn color(&self) -> &'static str {
        match self {
            Self::One => "#e53935", // red
            Self::Two => "#1e88e5", // blue
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameStatus {
    /// Moves are being accepted
    #[default]
    InProgress,
    /// Every box is owned and one slot holds more
    Won(Slot),
    /// Every box is owned and the scores are equal
    Draw,
    /// A participant ended the game early
    Aborted,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Won(_) => "won",
            Self::Draw => "draw",
            Self::Aborted => "aborted",
        }
    }

    /// Check if the game can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// The winning slot, if any.
    pub fn winner(&self) -> Option<Slot> {
        match self {
            Self::Won(slot) => Some(*slot),
            _ => None,
        }
    }
}

/// The only authoritative input to the state machine: one edge claim.
///
/// Its position in the relay's delivery order is itself load-bearing; two
/// replicas that apply the same events in the same order end up identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub edge: EdgeId,
    pub slot: Slot,
}

impl MoveEvent {
    pub fn new(edge: EdgeId, slot: Slot) -> Self {
        Self { edge, slot }
    }
}

/// Why a move took no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The game already reached a terminal status
    GameOver,
    /// The edge does not exist on this board
    UnknownEdge,
    /// The edge already has a claimant (duplicate delivery or replay)
    AlreadyClaimed,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver => write!(f, "Game is already over"),
            Self::UnknownEdge => write!(f, "Edge does not exist on this board"),
            Self::AlreadyClaimed => write!(f, "Edge is already claimed"),
        }
    }
}

/// Result of applying one move.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The edge was claimed. `completed` lists the boxes the move closed
    /// (possibly none), in board order.
    Applied {
        completed: Vec<BoxId>,
        next_turn: Slot,
        status: GameStatus,
    },
    /// The move changed nothing.
    Ignored(IgnoreReason),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// One session's replicated game state.
#[derive(Debug, Clone)]
pub struct Game {
    /// Session ID this game belongs to
    pub id: String,

    /// Board dimensions
    board: Board,

    /// Claimant per edge; `None` means unclaimed. Write-once.
    edges: HashMap<EdgeId, Option<Slot>>,

    /// Owner per box; `None` means open. Write-once.
    boxes: HashMap<BoxId, Option<Slot>>,

    /// Whose move is next
    pub turn: Slot,

    /// Boxes closed per slot, indexed by `Slot::index`
    scores: [u32; 2],

    /// Current status
    pub status: GameStatus,

    /// When this replica initialized the game
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When the game reached a terminal status
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Game {
    /// Create an empty game for a session. Slot One moves first.
    pub fn new(id: String, board: Board) -> Self {
        Self {
            id,
            board,
            edges: board.edges().map(|e| (e, None)).collect(),
            boxes: board.boxes().map(|b| (b, None)).collect(),
            turn: Slot::One,
            scores: [0, 0],
            status: GameStatus::InProgress,
            created_at: chrono::Utc::now(),
            ended_at: None,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// Apply one move from the ordered stream.
    ///
    /// Atomic and idempotent: the claim, box completion, scoring, status
    /// and turn updates all happen here in one step, and re-applying the
    /// same event is a no-op. Turn is intentionally *not* a precondition;
    /// when both replicas race to submit, whichever claim the relay orders
    /// first wins and the later one dies here as `AlreadyClaimed`.
    pub fn apply(&mut self, event: MoveEvent) -> ApplyOutcome {
        if self.status.is_terminal() {
            tracing::debug!(game = %self.id, edge = %event.edge, "move after terminal status ignored");
            return ApplyOutcome::Ignored(IgnoreReason::GameOver);
        }

        match self.edges.get(&event.edge) {
            None => {
                tracing::warn!(game = %self.id, edge = %event.edge, "move references unknown edge");
                return ApplyOutcome::Ignored(IgnoreReason::UnknownEdge);
            }
            Some(Some(_)) => {
                tracing::debug!(game = %self.id, edge = %event.edge, "duplicate edge claim ignored");
                return ApplyOutcome::Ignored(IgnoreReason::AlreadyClaimed);
            }
            Some(None) => {}
        }

        self.edges.insert(event.edge, Some(event.slot));

        // Ownership always credits the closer, even when the other slot
        // claimed the first three edges of the box.
        let completed: Vec<BoxId> = self
            .board
            .adjacent_boxes(event.edge)
            .into_iter()
            .filter(|b| self.box_owner(*b).is_none() && self.is_box_complete(*b))
            .collect();

        for id in &completed {
            self.boxes.insert(*id, Some(event.slot));
        }
        self.scores[event.slot.index()] += completed.len() as u32;

        if self.owned_box_count() == self.board.total_boxes() {
            self.status = match self.scores[0].cmp(&self.scores[1]) {
                std::cmp::Ordering::Greater => GameStatus::Won(Slot::One),
                std::cmp::Ordering::Less => GameStatus::Won(Slot::Two),
                std::cmp::Ordering::Equal => GameStatus::Draw,
            };
            self.ended_at = Some(chrono::Utc::now());
        }

        // Bonus turn for closing a box, otherwise hand over. Relative to
        // the mover, not the previous turn holder.
        self.turn = if completed.is_empty() {
            event.slot.other()
        } else {
            event.slot
        };

        ApplyOutcome::Applied {
            completed,
            next_turn: self.turn,
            status: self.status,
        }
    }

    /// End the game early. Terminal states never reopen, so aborting a
    /// finished game is a no-op.
    pub fn abort(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = GameStatus::Aborted;
        self.ended_at = Some(chrono::Utc::now());
    }

    /// Who claimed an edge, if anyone. `None` also covers unknown edges.
    pub fn claimant(&self, edge: EdgeId) -> Option<Slot> {
        self.edges.get(&edge).copied().flatten()
    }

    /// Who owns a box, if anyone.
    pub fn box_owner(&self, id: BoxId) -> Option<Slot> {
        self.boxes.get(&id).copied().flatten()
    }

    pub fn score(&self, slot: Slot) -> u32 {
        self.scores[slot.index()]
    }

    /// Check if it's a slot's turn.
    pub fn is_slot_turn(&self, slot: Slot) -> bool {
        self.turn == slot
    }

    /// Count claimed edges.
    pub fn claimed_edge_count(&self) -> usize {
        self.edges.values().filter(|c| c.is_some()).count()
    }

    /// Count owned boxes.
    pub fn owned_box_count(&self) -> usize {
        self.boxes.values().filter(|o| o.is_some()).count()
    }

    fn is_box_complete(&self, id: BoxId) -> bool {
        self.board
            .bounding_edges(id)
            .iter()
            .all(|e| self.claimant(*e).is_some())
    }

    /// Convert full game state to a JSON snapshot.
    ///
    /// Object keys are sorted, so two converged replicas serialize to the
    /// identical string.
    pub fn to_json(&self) -> serde_json::Value {
        let edges: serde_json::Map<String, serde_json::Value> = self
            .edges
            .iter()
            .map(|(e, claimant)| {
                (
                    e.to_string(),
                    claimant.map_or(serde_json::Value::Null, |s| s.as_str().into()),
                )
            })
            .collect();

        let boxes: serde_json::Map<String, serde_json::Value> = self
            .boxes
            .iter()
            .map(|(b, owner)| {
                (
                    b.to_string(),
                    owner.map_or(serde_json::Value::Null, |s| s.as_str().into()),
                )
            })
            .collect();

        serde_json::json!({
            "game_id": self.id,
            "status": self.status.as_str(),
            "winner": self.status.winner().map(|s| s.as_str()),
            "turn": self.turn.as_str(),
            "scores": {
                "p1": self.scores[0],
                "p2": self.scores[1],
            },
            "dimensions": {
                "boxes_x": self.board.boxes_x(),
                "boxes_y": self.board.boxes_y(),
                "dot_cols": self.board.dot_cols(),
                "dot_rows": self.board.dot_rows(),
            },
            "edges": edges,
            "boxes": boxes,
        })
    }
}

/// Game manager - tracks all active games, one per session.
///
/// Sessions share nothing, so a host may drive them independently.
#[derive(Debug, Default)]
pub struct GameManager {
    games: HashMap<String, Game>,
}

impl GameManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game.
    pub fn add(&mut self, game: Game) {
        self.games.insert(game.id.clone(), game);
    }

    /// Get a game.
    pub fn get(&self, game_id: &str) -> Option<&Game> {
        self.games.get(game_id)
    }

    /// Get a mutable game.
    pub fn get_mut(&mut self, game_id: &str) -> Option<&mut Game> {
        self.games.get_mut(game_id)
    }

    /// Remove a game.
    pub fn remove(&mut self, game_id: &str) -> Option<Game> {
        self.games.remove(game_id)
    }

    /// Remove games with terminal status. Returns the removed IDs.
    pub fn cleanup_finished(&mut self) -> Vec<String> {
        let finished: Vec<String> = self
            .games
            .iter()
            .filter(|(_, g)| g.status.is_terminal())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &finished {
            self.games.remove(id);
        }

        finished
    }

    /// Count games still accepting moves.
    pub fn active_count(&self) -> usize {
        self.games
            .values()
            .filter(|g| !g.status.is_terminal())
            .count()
    }

    /// Total game count.
    pub fn count(&self) -> usize {
        self.games.len()
    }
}
