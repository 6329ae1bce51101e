//! A single duel: two participants, one arena index, a score race.

use parking_lot::Mutex;
use worldcore_protocol::EntityId;

use crate::{DuelError, DuelState, SlotResource};

/// What a new [`DuelRoom`] is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelParams {
    pub challenger: EntityId,
    pub opponent: EntityId,
    pub max_score: u8,
}

#[derive(Debug)]
struct Progress {
    state: DuelState,
    /// `[challenger, opponent]`.
    scores: [u8; 2],
    winner: Option<EntityId>,
}

/// A live duel bound to one arena index.
///
/// Participants and index never change after allocation; only the
/// progress (state, scores, winner) moves forward.
#[derive(Debug)]
pub struct DuelRoom {
    index: usize,
    challenger: EntityId,
    opponent: EntityId,
    max_score: u8,
    progress: Mutex<Progress>,
}

impl SlotResource for DuelRoom {
    type Params = DuelParams;

    fn create(index: usize, params: DuelParams) -> Self {
        Self {
            index,
            challenger: params.challenger,
            opponent: params.opponent,
            max_score: params.max_score.max(1),
            progress: Mutex::new(Progress {
                state: DuelState::Preparing,
                scores: [0, 0],
                winner: None,
            }),
        }
    }

    fn index(&self) -> usize {
        self.index
    }
}

impl DuelRoom {
    /// The arena index this duel occupies.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `(challenger, opponent)`.
    pub fn participants(&self) -> (EntityId, EntityId) {
        (self.challenger, self.opponent)
    }

    pub fn involves(&self, entity: EntityId) -> bool {
        self.challenger == entity || self.opponent == entity
    }

    pub fn state(&self) -> DuelState {
        self.progress.lock().state
    }

    /// Score of `participant`, or `None` if they are not in this duel.
    pub fn score_of(&self, participant: EntityId) -> Option<u8> {
        let side = self.side_of(participant)?;
        Some(self.progress.lock().scores[side])
    }

    pub fn winner(&self) -> Option<EntityId> {
        self.progress.lock().winner
    }

    /// Both duelists are in the arena: `Preparing → InProgress`.
    pub fn start(&self) -> Result<(), DuelError> {
        let mut progress = self.progress.lock();
        self.transition(&mut progress, DuelState::InProgress, "start")?;
        tracing::info!(
            index = self.index,
            challenger = %self.challenger,
            opponent = %self.opponent,
            "duel started"
        );
        Ok(())
    }

    /// Scores one point for `participant`.
    ///
    /// Returns the winner once a side reaches the room's maximum score;
    /// the room is then `Finished` and further scoring is rejected.
    pub fn record_score(&self, participant: EntityId) -> Result<Option<EntityId>, DuelError> {
        let side = self
            .side_of(participant)
            .ok_or(DuelError::NotParticipant(participant, self.index))?;

        let mut progress = self.progress.lock();
        if progress.state != DuelState::InProgress {
            return Err(DuelError::InvalidState {
                index: self.index,
                state: progress.state,
                action: "score",
            });
        }

        progress.scores[side] = progress.scores[side].saturating_add(1);
        tracing::debug!(
            index = self.index,
            %participant,
            score = progress.scores[side],
            "duel score"
        );

        if progress.scores[side] < self.max_score {
            return Ok(None);
        }
        progress.state = DuelState::Finished;
        progress.winner = Some(participant);
        tracing::info!(index = self.index, winner = %participant, "duel decided");
        Ok(Some(participant))
    }

    /// Ends the duel without a winner (forfeit, disconnect).
    ///
    /// Allowed from `Preparing` as well; finishing twice is an error.
    pub fn abandon(&self) -> Result<(), DuelError> {
        let mut progress = self.progress.lock();
        if progress.state == DuelState::Finished {
            return Err(DuelError::InvalidState {
                index: self.index,
                state: progress.state,
                action: "abandon",
            });
        }
        progress.state = DuelState::Finished;
        tracing::info!(index = self.index, "duel abandoned");
        Ok(())
    }

    fn side_of(&self, entity: EntityId) -> Option<usize> {
        if entity == self.challenger {
            Some(0)
        } else if entity == self.opponent {
            Some(1)
        } else {
            None
        }
    }

    fn transition(
        &self,
        progress: &mut Progress,
        target: DuelState,
        action: &'static str,
    ) -> Result<(), DuelError> {
        if !progress.state.can_transition_to(target) {
            return Err(DuelError::InvalidState {
                index: self.index,
                state: progress.state,
                action,
            });
        }
        progress.state = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(max_score: u8) -> DuelRoom {
        DuelRoom::create(
            2,
            DuelParams {
                challenger: EntityId(1),
                opponent: EntityId(2),
                max_score,
            },
        )
    }

    #[test]
    fn test_create_starts_preparing() {
        let room = room(3);
        assert_eq!(room.index(), 2);
        assert_eq!(room.state(), DuelState::Preparing);
        assert_eq!(room.participants(), (EntityId(1), EntityId(2)));
        assert!(room.involves(EntityId(2)));
        assert!(!room.involves(EntityId(3)));
    }

    #[test]
    fn test_record_score_before_start_rejected() {
        let room = room(3);
        let err = room.record_score(EntityId(1)).unwrap_err();
        assert!(matches!(
            err,
            DuelError::InvalidState {
                state: DuelState::Preparing,
                ..
            }
        ));
    }

    #[test]
    fn test_record_score_reaches_max_declares_winner() {
        let room = room(2);
        room.start().unwrap();

        assert_eq!(room.record_score(EntityId(2)).unwrap(), None);
        assert_eq!(room.record_score(EntityId(1)).unwrap(), None);
        assert_eq!(room.record_score(EntityId(2)).unwrap(), Some(EntityId(2)));

        assert_eq!(room.state(), DuelState::Finished);
        assert_eq!(room.winner(), Some(EntityId(2)));
        assert_eq!(room.score_of(EntityId(1)), Some(1));
        assert!(room.record_score(EntityId(1)).is_err());
    }

    #[test]
    fn test_record_score_outsider_rejected() {
        let room = room(2);
        room.start().unwrap();
        let err = room.record_score(EntityId(9)).unwrap_err();
        assert!(matches!(err, DuelError::NotParticipant(EntityId(9), 2)));
    }

    #[test]
    fn test_start_twice_rejected() {
        let room = room(2);
        room.start().unwrap();
        assert!(room.start().is_err());
    }

    #[test]
    fn test_abandon_finishes_without_winner() {
        let room = room(2);
        room.abandon().unwrap();
        assert_eq!(room.state(), DuelState::Finished);
        assert_eq!(room.winner(), None);
        assert!(room.abandon().is_err());
    }
}
