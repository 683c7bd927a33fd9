use thiserror::Error;

use crate::MAX_TEAMS;

/// Every way a tournament operation can fail.
///
/// Each variant carries a human-readable reason via its `Display` impl and a
/// machine-readable tag via [`TournamentError::kind`]; the boundary layer
/// sends both. Validation and not-found failures are rejected before any
/// mutation; a persistence failure leaves the in-memory model untouched and
/// is never followed by a broadcast.
#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("maximum of {MAX_TEAMS} teams allowed")]
    CapacityExceeded,
    #[error("team name already exists: {0}")]
    DuplicateName(String),
    #[error("team name must not be empty")]
    EmptyName,
    #[error("game already completed: {0}")]
    GameAlreadyCompleted(String),
    #[error("game not found: {0}")]
    GameNotFound(String),
    #[error("score delta must be +1 or -1, got {0}")]
    InvalidDelta(i16),
    #[error("set index must be 1..={max}, got {0}", max = crate::SETS_PER_GAME)]
    InvalidSetIndex(usize),
    #[error("invalid teams: {0}")]
    InvalidTeams(String),
    #[error("persistence: {0}")]
    Persistence(String),
}

impl TournamentError {
    /// Stable tag written on the wire next to the reason string.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapacityExceeded => "capacity_exceeded",
            Self::DuplicateName(_) => "duplicate_name",
            Self::EmptyName => "empty_name",
            Self::GameAlreadyCompleted(_) => "game_already_completed",
            Self::GameNotFound(_) => "game_not_found",
            Self::InvalidDelta(_) => "invalid_delta",
            Self::InvalidSetIndex(_) => "invalid_set_index",
            Self::InvalidTeams(_) => "invalid_teams",
            Self::Persistence(_) => "persistence",
        }
    }
}
