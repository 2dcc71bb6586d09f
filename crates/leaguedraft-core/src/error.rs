// Errors returned by the draft collaborator.

use thiserror::Error;

/// No definitive answer was received from the collaborator.
///
/// Callers must not assume a mutation succeeded or failed when they see one of
/// these; the next successful snapshot is the only way to find out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("collaborator returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not authorized; sign in again")]
    Unauthorized,

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Outcome of a rejected or failed mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The team was not on the clock when the collaborator processed the pick.
    #[error("it is not your turn to pick")]
    NotYourTurn,

    /// The player was claimed by a concurrent pick.
    #[error("player is no longer available")]
    PlayerUnavailable,

    /// A definitive refusal for any other reason (roster rules, cap, draft
    /// already initialized, ...). The collaborator decides legality.
    #[error("rejected: {message}")]
    Rejected { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            message: message.into(),
        }
    }

    /// Whether the collaborator gave a definitive answer.
    pub fn is_definitive(&self) -> bool {
        !matches!(self, ApiError::Transport(_))
    }
}
