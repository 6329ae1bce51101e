//! Error types for the duel layer.

use worldcore_protocol::EntityId;

use crate::DuelState;

/// Errors that can occur during duel operations.
///
/// Running out of duel rooms is *not* an error; it is reported as
/// [`SlotOutcome::NoSlotAvailable`](crate::SlotOutcome::NoSlotAvailable).
#[derive(Debug, thiserror::Error)]
pub enum DuelError {
    /// The participant is already fighting in another room.
    #[error("{0} is already in duel room {1}")]
    AlreadyInDuel(EntityId, usize),

    /// A duel needs two different participants.
    #[error("{0} cannot duel itself")]
    SelfDuel(EntityId),

    /// The entity is not one of the room's two participants.
    #[error("{0} is not a participant of duel room {1}")]
    NotParticipant(EntityId, usize),

    /// The room is in a state that doesn't allow this operation.
    #[error("duel room {index} is {state}, cannot {action}")]
    InvalidState {
        index: usize,
        state: DuelState,
        action: &'static str,
    },
}
