// This file is part of volley-live.
//
// volley-live is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// volley-live is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::info;

use crate::{
    MAX_TEAMS, SETS_PER_GAME,
    error::TournamentError,
    game::{Game, Side, Winner},
    message::TeamCreate,
    standings::{self, Standing},
    store::Store,
    team::Team,
};

/// The authoritative tournament state: `name -> Team` and `key -> Game`.
///
/// Every mutation validates first, writes through the [`Store`] second, and
/// only then touches the in-memory maps, so a failed durable write leaves
/// the model exactly as it was. All reads hand out owned snapshots.
///
/// The engine itself is not synchronized; the server owns one instance on a
/// single authority thread and serializes all mutations through it.
pub struct Engine {
    teams: BTreeMap<String, Team>,
    games: BTreeMap<String, Game>,
    store: Box<dyn Store>,
}

impl Engine {
    /// Loads the full tournament state out of the store.
    ///
    /// # Errors
    ///
    /// If the store cannot be read.
    pub fn load(store: Box<dyn Store>) -> anyhow::Result<Self> {
        let teams = store.load_teams()?;
        let games = store.load_games()?;

        info!("loaded {} teams, {} games", teams.len(), games.len());

        Ok(Self {
            teams,
            games,
            store,
        })
    }

    #[must_use]
    pub fn teams(&self) -> BTreeMap<String, Team> {
        self.teams.clone()
    }

    #[must_use]
    pub fn games(&self) -> BTreeMap<String, Game> {
        self.games.clone()
    }

    #[must_use]
    pub fn team(&self, name: &str) -> Option<Team> {
        self.teams.get(name).cloned()
    }

    #[must_use]
    pub fn game(&self, key: &str) -> Option<Game> {
        self.games.get(key).cloned()
    }

    #[must_use]
    pub fn standings(&self) -> Vec<Standing> {
        standings::compute(&self.teams, &self.games)
    }

    /// Registers a new team.
    ///
    /// Names are compared case-sensitively, so "Alpha" and "ALPHA" are two
    /// different teams.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` at the team limit, `DuplicateName` on an exact
    /// name match, `EmptyName` for a blank name, `Persistence` if the
    /// durable write fails.
    pub fn register_team(&mut self, create: TeamCreate) -> Result<Team, TournamentError> {
        if create.name.trim().is_empty() {
            return Err(TournamentError::EmptyName);
        }
        if self.teams.len() >= MAX_TEAMS {
            return Err(TournamentError::CapacityExceeded);
        }
        if self.teams.contains_key(&create.name) {
            return Err(TournamentError::DuplicateName(create.name));
        }

        let team = Team {
            name: create.name,
            player1: create.player1,
            player2: create.player2,
            pool: create.pool,
        };

        persist(self.store.save_team(&team))?;
        info!("registered team {} in pool {}", team.name, team.pool);

        self.teams.insert(team.name.clone(), team.clone());
        Ok(team)
    }

    /// Creates a game between two distinct registered teams with all sets
    /// at 0-0.
    ///
    /// # Errors
    ///
    /// `InvalidTeams` when the teams are equal or either is unregistered,
    /// `Persistence` if the durable write fails.
    pub fn create_game(
        &mut self,
        team1: &str,
        team2: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, Game), TournamentError> {
        if team1 == team2 {
            return Err(TournamentError::InvalidTeams(format!(
                "a team cannot play itself: {team1}"
            )));
        }
        for name in [team1, team2] {
            if !self.teams.contains_key(name) {
                return Err(TournamentError::InvalidTeams(format!(
                    "unknown team: {name}"
                )));
            }
        }

        let key = self.fresh_key(team1, team2, now);
        let game = Game::new(team1.to_string(), team2.to_string(), now);

        persist(self.store.save_game(&key, &game))?;
        info!("created game {key}");

        self.games.insert(key.clone(), game.clone());
        Ok((key, game))
    }

    /// Applies a ±1 score change to one set of a live game, clamped at zero.
    ///
    /// # Errors
    ///
    /// `InvalidDelta` / `InvalidSetIndex` on bad input, `GameNotFound` for
    /// an unknown key, `GameAlreadyCompleted` once scores are frozen,
    /// `Persistence` if the durable write fails.
    pub fn adjust_score(
        &mut self,
        key: &str,
        set: usize,
        side: Side,
        delta: i16,
    ) -> Result<Game, TournamentError> {
        if delta != 1 && delta != -1 {
            return Err(TournamentError::InvalidDelta(delta));
        }
        if !(1..=SETS_PER_GAME).contains(&set) {
            return Err(TournamentError::InvalidSetIndex(set));
        }

        let Some(game) = self.games.get(key) else {
            return Err(TournamentError::GameNotFound(key.to_string()));
        };
        if game.completed {
            return Err(TournamentError::GameAlreadyCompleted(key.to_string()));
        }

        let mut updated = game.clone();
        updated.bump(set - 1, side, delta);

        persist(self.store.save_game(key, &updated))?;

        self.games.insert(key.to_string(), updated.clone());
        Ok(updated)
    }

    /// Completes a game and derives the winner.
    ///
    /// Safe to retry: completing an already-completed game recomputes the
    /// winner without moving the timestamps.
    ///
    /// # Errors
    ///
    /// `GameNotFound` for an unknown key, `Persistence` if the durable
    /// write fails.
    pub fn complete_game(
        &mut self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Winner, TournamentError> {
        let Some(game) = self.games.get(key) else {
            return Err(TournamentError::GameNotFound(key.to_string()));
        };

        let mut updated = game.clone();
        let winner = updated.complete(now);

        persist(self.store.save_game(key, &updated))?;
        info!("completed game {key}, winner: {winner}");

        self.games.insert(key.to_string(), updated);
        Ok(winner)
    }

    /// Irrecoverably deletes every team and game.
    ///
    /// # Errors
    ///
    /// `Persistence` if the wipe fails; the in-memory state is kept in that
    /// case.
    pub fn reset_all(&mut self) -> Result<(), TournamentError> {
        persist(self.store.wipe())?;
        info!("tournament reset");

        self.teams.clear();
        self.games.clear();
        Ok(())
    }

    /// Readable key `<team1>_vs_<team2>_<stamp>`; a random suffix breaks the
    /// tie when two games for the same pair start within one second.
    fn fresh_key(&self, team1: &str, team2: &str, now: DateTime<Utc>) -> String {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let mut key = format!("{team1}_vs_{team2}_{stamp}");

        while self.games.contains_key(&key) {
            key = format!("{team1}_vs_{team2}_{stamp}-{:08x}", rand::random::<u32>());
        }

        key
    }
}

fn persist<T>(result: anyhow::Result<T>) -> Result<T, TournamentError> {
    result.map_err(|err| TournamentError::Persistence(err.to_string()))
}
