//! Duel configuration and room state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DuelConfig
// ---------------------------------------------------------------------------

/// Configuration for the duel subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Number of designated duel areas on the server. Fixed for the
    /// lifetime of the [`DuelRoomManager`](crate::DuelRoomManager).
    pub area_count: usize,

    /// Score at which a duel is decided.
    pub max_score: u8,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            area_count: 4,
            max_score: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// DuelState
// ---------------------------------------------------------------------------

/// The lifecycle state of a duel room.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Preparing → InProgress → Finished
/// ```
///
/// - **Preparing**: the room is allocated, both duelists are being moved
///   into the arena.
/// - **InProgress**: hits are being scored.
/// - **Finished**: a winner is known (or the duel was abandoned). The
///   room stays allocated until it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelState {
    Preparing,
    InProgress,
    Finished,
}

impl DuelState {
    /// Returns the next state, or `None` from `Finished`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Preparing => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for DuelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preparing => write!(f, "Preparing"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
