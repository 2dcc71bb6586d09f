// Outcomes surfaced to the interface layer for pick and start attempts.

use thiserror::Error;

use leaguedraft_core::error::{ApiError, TransportError};
use leaguedraft_core::PlayerId;

/// Why a pick attempt did not commit.
///
/// `NotYourTurn`, `PlayerUnavailable` and `SubmissionInProgress` are routine
/// outcomes of drafting against other clients, not faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("it is not your turn to pick")]
    NotYourTurn,

    #[error("player is no longer available")]
    PlayerUnavailable,

    #[error("pick rejected: {message}")]
    Rejected { message: String },

    /// No definitive answer. The pick may or may not have committed; the
    /// next refresh decides.
    #[error("no answer from the league server ({0}); checking whether the pick went through")]
    Transport(TransportError),

    #[error("a pick is already being submitted")]
    SubmissionInProgress,

    #[error("the draft is complete")]
    DraftComplete,

    #[error("the draft has not started")]
    DraftNotStarted,

    #[error("no player selected")]
    NoSelection,

    #[error("player {player_id} is not in the player pool")]
    UnknownPlayer { player_id: PlayerId },
}

impl From<ApiError> for PickError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotYourTurn => PickError::NotYourTurn,
            ApiError::PlayerUnavailable => PickError::PlayerUnavailable,
            ApiError::Rejected { message } => PickError::Rejected { message },
            ApiError::Transport(e) => PickError::Transport(e),
        }
    }
}

impl PickError {
    /// Raised by a local guard without contacting the collaborator.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PickError::SubmissionInProgress
                | PickError::DraftComplete
                | PickError::DraftNotStarted
                | PickError::NoSelection
                | PickError::UnknownPlayer { .. }
        )
    }

    /// Whether the selection survives this outcome so the user can retry.
    pub fn keeps_selection(&self) -> bool {
        !matches!(self, PickError::PlayerUnavailable)
    }
}

/// Why the start action did not run or did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("the draft is already being started")]
    AlreadyRunning,

    #[error("the draft has already started")]
    AlreadyStarted,

    #[error("the draft is complete")]
    DraftComplete,

    #[error(transparent)]
    Api(#[from] ApiError),
}
