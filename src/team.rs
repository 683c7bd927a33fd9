use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pool::Pool;

/// A registered team of two players.
///
/// The name is the primary key and never changes; players are set once at
/// registration. Uniqueness of names is case-sensitive exact match.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    pub name: String,
    pub player1: String,
    pub player2: String,
    pub pool: Pool,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} / {}) pool {}",
            self.name, self.player1, self.player2, self.pool
        )
    }
}
