//! Handler lifecycle states.
//!
//! ```text
//! UNDETERMINED ──▶ BEGAN ──▶ ACTIVE ──▶ END
//!      │             │  │       │
//!      └──▶ FAILED ◀─┘  └───────┴──▶ CANCELLED
//! ```
//!
//! `END`, `FAILED` and `CANCELLED` are terminal for an episode. A handler only
//! returns to `UNDETERMINED` through a reset, never through a transition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a gesture handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum HandlerState {
    #[default]
    Undetermined = 0,
    Failed = 1,
    Began = 2,
    Cancelled = 3,
    Active = 4,
    End = 5,
}

impl HandlerState {
    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub const fn can_transition_to(self, next: HandlerState) -> bool {
        use HandlerState::*;
        matches!(
            (self, next),
            (Undetermined, Began)
                | (Undetermined, Failed)
                | (Began, Active)
                | (Began, Failed)
                | (Began, Cancelled)
                | (Active, End)
                | (Active, Cancelled)
        )
    }

    /// Terminal states end an episode.
    pub const fn is_finished(self) -> bool {
        matches!(
            self,
            HandlerState::End | HandlerState::Failed | HandlerState::Cancelled
        )
    }

    /// `BEGAN` or `ACTIVE`: the handler is tracking a gesture.
    pub const fn is_in_progress(self) -> bool {
        matches!(self, HandlerState::Began | HandlerState::Active)
    }

    /// `ACTIVE` or `END`: the handler recognized its gesture.
    pub const fn has_succeeded(self) -> bool {
        matches!(self, HandlerState::Active | HandlerState::End)
    }

    /// Wire code used by platform bridges.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            HandlerState::Undetermined => "UNDETERMINED",
            HandlerState::Failed => "FAILED",
            HandlerState::Began => "BEGAN",
            HandlerState::Cancelled => "CANCELLED",
            HandlerState::Active => "ACTIVE",
            HandlerState::End => "END",
        }
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check that a sequence of visited states is a valid walk, starting from
/// `UNDETERMINED`, where a return to `UNDETERMINED` is only allowed after a
/// terminal state (a reset between episodes).
pub fn is_legal_path(states: &[HandlerState]) -> bool {
    let mut current = HandlerState::Undetermined;
    for &next in states {
        let reset = current.is_finished() && next == HandlerState::Undetermined;
        if !reset && !current.can_transition_to(next) {
            return false;
        }
        current = next;
    }
    true
}
