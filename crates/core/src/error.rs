//! Error taxonomy shared by the session store and its collaborators.

use thiserror::Error;

use crate::models::{MAX_TEAMS, MIN_TEAMS};

/// Result alias used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure surfaced by a session store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend call failed; nothing was cached.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// A local precondition was violated before any remote call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The referenced entity is not part of the local session.
    #[error("{entity} {id} not found in session")]
    NotFound {
        /// Kind of entity, e.g. `team`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: i64,
    },
}

impl StoreError {
    /// True for failures caused by the backend or the transport.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// True for failures detected locally before touching the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub(crate) fn team_not_found(id: i64) -> Self {
        Self::NotFound { entity: "team", id }
    }
}

/// Transport or HTTP failure with a human-readable message.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
    /// Any other transport failure.
    #[error("request failed: {0}")]
    Other(String),
}

impl RemoteError {
    /// Status code, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Local precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Another player in the session already uses this name.
    #[error("player '{0}' already exists")]
    DuplicatePlayerName(String),
    /// An operation needed an identifier the entity does not have.
    #[error("{0} id required")]
    MissingId(&'static str),
    /// A name was blank after trimming.
    #[error("name must not be empty")]
    EmptyName,
    /// Requested team count is outside the supported range.
    #[error("team count must be between {MIN_TEAMS} and {MAX_TEAMS}, got {0}")]
    TeamCount(usize),
    /// Fewer teams than required have players.
    #[error("at least {required} teams need players")]
    NotEnoughTeams {
        /// Minimum number of populated teams.
        required: usize,
    },
    /// Fewer teams than required have enough players.
    #[error("at least {teams} teams need {players} or more players each")]
    NotEnoughPlayers {
        /// Minimum number of teams meeting the player count.
        teams: usize,
        /// Minimum players per team.
        players: usize,
    },
    /// Turn index does not address an active team.
    #[error("team index {index} out of range for {active} active teams")]
    TeamIndex {
        /// Requested index.
        index: usize,
        /// Number of active teams.
        active: usize,
    },
    /// No player with this name exists in the local roster.
    #[error("unknown player '{0}'")]
    UnknownPlayer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_and_validation_failures_are_distinguishable() {
        let remote = StoreError::from(RemoteError::Status {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(remote.is_remote());
        assert!(!remote.is_validation());
        assert_eq!(remote.to_string(), "backend returned 500: boom");

        let local = StoreError::from(ValidationError::DuplicatePlayerName("Ann".to_string()));
        assert!(local.is_validation());
        assert_eq!(local.to_string(), "player 'Ann' already exists");

        let missing = StoreError::team_not_found(9);
        assert!(!missing.is_remote() && !missing.is_validation());
        assert_eq!(missing.to_string(), "team 9 not found in session");
    }

    #[test]
    fn team_count_message_names_bounds() {
        assert_eq!(
            ValidationError::TeamCount(7).to_string(),
            "team count must be between 1 and 4, got 7"
        );
    }
}
