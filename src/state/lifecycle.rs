//! Session lifecycle controller.
//!
//! Tracks one session's phase from handshake to retirement and validates
//! transitions. All phases are monotonic forward-only; no phase is
//! re-enterable.
//!
//! # Phase Diagram
//!
//! ```text
//! ┌─────────┐  begin   ┌────────┐  finish   ┌───────────┐
//! │ Pending │─────────▶│ Active │──────────▶│ Completed │
//! └────┬────┘          └───┬────┘           └───────────┘
//!      │                   │
//!      │ abort             │ abort
//!      ▼                   ▼
//! ┌─────────────────────────────┐
//! │           Aborted           │
//! └─────────────────────────────┘
//! ```
//!
//! Once `Completed` or `Aborted`, the session applies no further move
//! events, even if the relay still delivers some.

use std::fmt;

use super::game::Slot;

/// How a completed session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndKind {
    Won(Slot),
    Draw,
}

impl fmt::Display for EndKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won(slot) => write!(f, "Won({})", slot),
            Self::Draw => write!(f, "Draw"),
        }
    }
}

/// A session's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Handshake not yet resolved
    #[default]
    Pending,
    /// State machine accepting move events
    Active,
    /// Played to the end
    Completed(EndKind),
    /// Ended early by an explicit termination event
    Aborted,
}

impl SessionPhase {
    /// Check if the session accepts move events.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if the session can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Aborted)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Active => write!(f, "Active"),
            Self::Completed(kind) => write!(f, "Completed({})", kind),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Phase transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Handshake resolved, session starts
    Begin,
    /// The game reached Won or Draw
    Finish(EndKind),
    /// A participant terminated the session
    Abort,
}

/// Error when a phase transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPhase {
    pub from: SessionPhase,
    pub event: PhaseEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidPhase {}

/// Session phase machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifecycle {
    phase: SessionPhase,
}

impl Lifecycle {
    /// Create a new lifecycle in `Pending`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Apply an event, returning the new state or an error.
    pub fn apply(&self, event: PhaseEvent) -> Result<Self, InvalidPhase> {
        Ok(Self {
            phase: self.transition(event)?,
        })
    }

    /// Apply an event in place, returning error if invalid.
    pub fn apply_mut(&mut self, event: PhaseEvent) -> Result<(), InvalidPhase> {
        self.phase = self.transition(event)?;
        Ok(())
    }

    /// Calculate the new phase for an event.
    fn transition(&self, event: PhaseEvent) -> Result<SessionPhase, InvalidPhase> {
        use PhaseEvent::*;
        use SessionPhase::*;

        let invalid = |reason: &'static str| InvalidPhase {
            from: self.phase,
            event,
            reason,
        };

        match (self.phase, event) {
            (Pending, Begin) => Ok(Active),
            (Active, Begin) => Err(invalid("Already active")),
            (Completed(_) | Aborted, Begin) => Err(invalid("Session already ended")),

            (Active, Finish(kind)) => Ok(Completed(kind)),
            (Pending, Finish(_)) => Err(invalid("Session never started")),
            (Completed(_) | Aborted, Finish(_)) => Err(invalid("Session already ended")),

            (Pending | Active, Abort) => Ok(Aborted),
            (Completed(_) | Aborted, Abort) => Err(invalid("Session already ended")),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), SessionPhase::Pending);
        assert!(!lifecycle.is_active());
        assert!(!lifecycle.is_terminal());
    }

    #[test]
    fn test_normal_flow() {
        let mut lifecycle = Lifecycle::new();

        lifecycle.apply_mut(PhaseEvent::Begin).unwrap();
        assert!(lifecycle.is_active());

        lifecycle
            .apply_mut(PhaseEvent::Finish(EndKind::Won(Slot::One)))
            .unwrap();
        assert_eq!(
            lifecycle.phase(),
            SessionPhase::Completed(EndKind::Won(Slot::One))
        );
        assert!(lifecycle.is_terminal());
    }

    #[test]
    fn test_abort_from_pending_and_active() {
        let mut pending = Lifecycle::new();
        pending.apply_mut(PhaseEvent::Abort).unwrap();
        assert_eq!(pending.phase(), SessionPhase::Aborted);

        let mut active = Lifecycle::new();
        active.apply_mut(PhaseEvent::Begin).unwrap();
        active.apply_mut(PhaseEvent::Abort).unwrap();
        assert_eq!(active.phase(), SessionPhase::Aborted);
    }

    #[test]
    fn test_terminal_phases_are_final() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.apply_mut(PhaseEvent::Begin).unwrap();
        lifecycle
            .apply_mut(PhaseEvent::Finish(EndKind::Draw))
            .unwrap();

        assert!(lifecycle.apply(PhaseEvent::Begin).is_err());
        assert!(lifecycle.apply(PhaseEvent::Abort).is_err());
        assert!(lifecycle
            .apply(PhaseEvent::Finish(EndKind::Won(Slot::Two)))
            .is_err());

        let mut aborted = Lifecycle::new();
        aborted.apply_mut(PhaseEvent::Abort).unwrap();
        assert!(aborted.apply(PhaseEvent::Begin).is_err());
        assert!(aborted.apply(PhaseEvent::Abort).is_err());
    }

    #[test]
    fn test_cannot_finish_before_begin() {
        let lifecycle = Lifecycle::new();
        let result = lifecycle.apply(PhaseEvent::Finish(EndKind::Draw));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.from, SessionPhase::Pending);
        assert_eq!(err.reason, "Session never started");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", SessionPhase::Completed(EndKind::Won(Slot::Two))),
            "Completed(Won(p2))"
        );
        assert_eq!(format!("{}", SessionPhase::Pending), "Pending");
    }
}
