use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SETS_PER_GAME;

/// One set's running score.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SetScore {
    pub team1: u16,
    pub team2: u16,
}

/// Which side of a game a score adjustment applies to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Team1,
    Team2,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team1 => write!(f, "team1"),
            Self::Team2 => write!(f, "team2"),
        }
    }
}

/// Outcome of a completed game.
///
/// `Split` is the sentinel for one set won by each side.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Team(String),
    Split,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team(name) => write!(f, "{name}"),
            Self::Split => write!(f, "Split"),
        }
    }
}

/// A two-set game between two registered teams.
///
/// Scores are freely adjustable while `completed` is false; completion is
/// terminal and freezes the scores. `start_time` and `end_time` are each set
/// exactly once.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Game {
    pub team1: String,
    pub team2: String,
    pub sets: [SetScore; SETS_PER_GAME],
    pub completed: bool,
    pub winner: Option<Winner>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Game {
    #[must_use]
    pub fn new(team1: String, team2: String, start_time: DateTime<Utc>) -> Self {
        Self {
            team1,
            team2,
            sets: [SetScore::default(); SETS_PER_GAME],
            completed: false,
            winner: None,
            start_time,
            end_time: None,
        }
    }

    /// Applies a ±1 delta to one side of one set, clamped at zero.
    ///
    /// `set` is zero-based and must be in range; the engine validates the
    /// one-based wire index, the completion freeze, and the delta before
    /// calling this.
    pub(crate) fn bump(&mut self, set: usize, side: Side, delta: i16) {
        if let Some(scores) = self.sets.get_mut(set) {
            match side {
                Side::Team1 => scores.team1 = scores.team1.saturating_add_signed(delta),
                Side::Team2 => scores.team2 = scores.team2.saturating_add_signed(delta),
            }
        }
    }

    /// Set wins per side, strict inequality: an equal set counts for neither.
    #[must_use]
    pub fn set_wins(&self) -> (u32, u32) {
        let mut team1 = 0;
        let mut team2 = 0;

        for set in &self.sets {
            if set.team1 > set.team2 {
                team1 += 1;
            } else if set.team2 > set.team1 {
                team2 += 1;
            }
        }

        (team1, team2)
    }

    /// Overall winner by majority of set wins; equal set wins is a
    /// [`Winner::Split`].
    #[must_use]
    pub fn winner_by_sets(&self) -> Winner {
        let (team1, team2) = self.set_wins();

        if team1 > team2 {
            Winner::Team(self.team1.clone())
        } else if team2 > team1 {
            Winner::Team(self.team2.clone())
        } else {
            Winner::Split
        }
    }

    /// Marks the game completed and records the winner.
    ///
    /// Idempotent: re-completion recomputes the winner deterministically but
    /// `end_time` never moves after the first call.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Winner {
        let winner = self.winner_by_sets();
        self.winner = Some(winner.clone());

        if !self.completed {
            self.completed = true;
            self.end_time = Some(now);
        }

        winner
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team1, self.team2)?;

        for (index, set) in self.sets.iter().enumerate() {
            write!(f, ", set {}: {}-{}", index + 1, set.team1, set.team2)?;
        }

        if let Some(winner) = &self.winner {
            write!(f, ", winner: {winner}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new("Aces".to_string(), "Blockers".to_string(), Utc::now())
    }

    #[test]
    fn scores_clamp_at_zero() {
        let mut game = game();

        game.bump(0, Side::Team1, -1);
        assert_eq!(game.sets[0].team1, 0);

        game.bump(0, Side::Team1, 1);
        game.bump(0, Side::Team1, 1);
        game.bump(0, Side::Team1, -1);
        assert_eq!(game.sets[0].team1, 1);
        assert_eq!(game.sets[0].team2, 0);
    }

    #[test]
    fn split_when_sets_are_shared() {
        let mut game = game();
        game.sets[0] = SetScore { team1: 21, team2: 19 };
        game.sets[1] = SetScore { team1: 18, team2: 21 };

        assert_eq!(game.set_wins(), (1, 1));
        assert_eq!(game.winner_by_sets(), Winner::Split);
    }

    #[test]
    fn team1_wins_both_sets() {
        let mut game = game();
        game.sets[0] = SetScore { team1: 21, team2: 15 };
        game.sets[1] = SetScore { team1: 21, team2: 18 };

        assert_eq!(game.winner_by_sets(), Winner::Team("Aces".to_string()));
    }

    #[test]
    fn equal_sets_count_for_neither() {
        let mut game = game();
        game.sets[0] = SetScore { team1: 21, team2: 21 };
        game.sets[1] = SetScore { team1: 10, team2: 21 };

        assert_eq!(game.set_wins(), (0, 1));
        assert_eq!(
            game.winner_by_sets(),
            Winner::Team("Blockers".to_string())
        );
    }

    #[test]
    fn completion_is_idempotent() {
        let mut game = game();
        game.sets[0] = SetScore { team1: 21, team2: 15 };
        game.sets[1] = SetScore { team1: 21, team2: 18 };

        let first = game.complete(Utc::now());
        let start = game.start_time;
        let end = game.end_time;

        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = game.complete(Utc::now());

        assert_eq!(first, second);
        assert_eq!(game.start_time, start);
        assert_eq!(game.end_time, end);
        assert!(game.completed);
    }
}
