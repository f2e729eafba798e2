//! Errors surfaced to whoever drives a game session

use crate::game::board::{BoardError, PlacementError};
use crate::game::turn::CommitError;
use crate::game::validation::{EvaluationError, TurnEvaluation};
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TurnError {
    /// A board or rack move broke a placement rule; nothing changed
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// Words cannot be checked yet
    #[error("dictionary is still loading, try again in a moment")]
    DictionaryNotReady,
    /// At least one new word is unknown; the full evaluation is attached
    #[error("{}", .0.message())]
    ValidationRejected(TurnEvaluation),
    /// The store refused or failed the update; local state is kept for a retry
    #[error("could not save the turn: {0}")]
    Persistence(#[from] StorageError),
    /// The stored board could not be read back
    #[error("stored game is corrupt: {0}")]
    CorruptRecord(#[from] BoardError),
    #[error("no game is open")]
    NoActiveGame,
    #[error("you are not seated in this game")]
    NotSeated,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("the game is finished")]
    GameFinished,
    /// A failed commit is waiting for a retry; the board is frozen until then
    #[error("the last turn has not been saved yet, retry first")]
    CommitPending,
    #[error("there is no unsaved turn to retry")]
    NothingToRetry,
}

impl From<EvaluationError> for TurnError {
    fn from(e: EvaluationError) -> Self {
        match e {
            EvaluationError::DictionaryNotReady => TurnError::DictionaryNotReady,
        }
    }
}

impl From<CommitError> for TurnError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::Rejected => TurnError::ValidationRejected(TurnEvaluation::default()),
            CommitError::NotSeated(_) => TurnError::NotSeated,
            CommitError::NotYourTurn(_) => TurnError::NotYourTurn,
            CommitError::GameFinished => TurnError::GameFinished,
        }
    }
}
