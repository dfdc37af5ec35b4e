//! Move submission gate.
//!
//! A local, advisory check run before a replica *submits* a candidate move
//! to the relay. It is a UX shortcut only: the authoritative decision of
//! whether a move counts is made by `Game::apply` when the event comes
//! back through the ordered stream. A blocked attempt is dropped on the
//! spot with a short-lived user-facing notice; it is never transmitted and
//! never recorded as a protocol error.

use std::fmt;
use std::time::{Duration, Instant};

use super::game::{Game, Slot};

/// How long a submission notice stays visible (3 seconds).
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Why a candidate move was not submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// No slot assigned yet for this session
    NotJoined,
    /// The session already reached a terminal status
    GameOver,
    /// The submitting slot is not the current turn holder
    NotYourTurn,
    /// The outbound channel to the relay is not open
    ChannelClosed,
}

impl fmt::Display for SubmitBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJoined => write!(f, "You are not a player in this game"),
            Self::GameOver => write!(f, "The game is over"),
            Self::NotYourTurn => write!(f, "It's not your turn"),
            Self::ChannelClosed => write!(f, "Connection lost, move not sent"),
        }
    }
}

impl std::error::Error for SubmitBlocked {}

/// Check whether this replica may submit a move right now.
///
/// Order matters for the message the user sees: a finished game reports
/// `GameOver` even when it also isn't their turn.
pub fn check_submission(game: &Game, slot: Slot, channel_open: bool) -> Result<(), SubmitBlocked> {
    if game.status.is_terminal() {
        return Err(SubmitBlocked::GameOver);
    }
    if !game.is_slot_turn(slot) {
        return Err(SubmitBlocked::NotYourTurn);
    }
    if !channel_open {
        return Err(SubmitBlocked::ChannelClosed);
    }
    Ok(())
}

/// A transient, auto-expiring user-facing notice.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub created_at: Instant,
    expires_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_ttl(text, DEFAULT_NOTICE_TTL)
    }

    pub fn with_ttl(text: impl Into<String>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            text: text.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

impl From<SubmitBlocked> for Notice {
    fn from(blocked: SubmitBlocked) -> Self {
        Notice::new(blocked.to_string())
    }
}

/// Holds the live notices for one replica.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice.
    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drop expired notices. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let before = self.notices.len();
        self.notices.retain(|n| !n.is_expired());
        before - self.notices.len()
    }

    /// Live notices, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| !n.is_expired())
    }

    pub fn len(&self) -> usize {
        self.notices.iter().filter(|n| !n.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
