use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{game::Game, pool::Pool, team::Team};

/// One team's aggregated record across all completed games.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Standing {
    pub team: String,
    pub pool: Pool,
    pub games_played: u32,
    pub set_wins: u32,
    pub set_losses: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub point_differential: i64,
}

impl Standing {
    fn new(team: &Team) -> Self {
        Self {
            team: team.name.clone(),
            pool: team.pool,
            games_played: 0,
            set_wins: 0,
            set_losses: 0,
            points_for: 0,
            points_against: 0,
            point_differential: 0,
        }
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (pool {}): {}-{} sets, {:+} points",
            self.team, self.pool, self.set_wins, self.set_losses, self.point_differential
        )
    }
}

/// Ranks every registered team by its record over the completed games.
///
/// Pure and deterministic: identical inputs always yield identical output
/// ordering. Completed games referencing teams that are no longer
/// registered are skipped silently. Ordering is descending by
/// `(set_wins, point_differential)`; further ties stay in team-name order
/// because accumulation walks a name-keyed map and the sort is stable.
#[must_use]
pub fn compute(teams: &BTreeMap<String, Team>, games: &BTreeMap<String, Game>) -> Vec<Standing> {
    let mut standings: BTreeMap<&str, Standing> = teams
        .values()
        .map(|team| (team.name.as_str(), Standing::new(team)))
        .collect();

    for game in games.values() {
        if !game.completed
            || !standings.contains_key(game.team1.as_str())
            || !standings.contains_key(game.team2.as_str())
        {
            continue;
        }

        for (name, other) in [(&game.team1, false), (&game.team2, true)] {
            if let Some(standing) = standings.get_mut(name.as_str()) {
                standing.games_played += 1;

                for set in &game.sets {
                    let (own, opponent) = if other {
                        (set.team2, set.team1)
                    } else {
                        (set.team1, set.team2)
                    };

                    standing.points_for += u32::from(own);
                    standing.points_against += u32::from(opponent);

                    if own > opponent {
                        standing.set_wins += 1;
                    } else if opponent > own {
                        standing.set_losses += 1;
                    }
                }
            }
        }
    }

    let mut ranked: Vec<Standing> = standings
        .into_values()
        .map(|mut standing| {
            standing.point_differential =
                i64::from(standing.points_for) - i64::from(standing.points_against);
            standing
        })
        .collect();

    ranked.sort_by(|a, b| {
        (b.set_wins, b.point_differential).cmp(&(a.set_wins, a.point_differential))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::game::SetScore;

    fn team(name: &str) -> Team {
        Team {
            name: name.to_string(),
            player1: String::new(),
            player2: String::new(),
            pool: Pool::A,
        }
    }

    fn completed(team1: &str, team2: &str, sets: [(u16, u16); 2]) -> Game {
        let mut game = Game::new(team1.to_string(), team2.to_string(), Utc::now());

        for (index, (a, b)) in sets.into_iter().enumerate() {
            game.sets[index] = SetScore { team1: a, team2: b };
        }

        game.complete(Utc::now());
        game
    }

    fn fixture() -> (BTreeMap<String, Team>, BTreeMap<String, Game>) {
        let teams: BTreeMap<String, Team> = ["Alpha", "Bravo", "Charlie"]
            .into_iter()
            .map(|name| (name.to_string(), team(name)))
            .collect();

        // Alpha sweeps Bravo comfortably, Bravo sweeps Charlie narrowly,
        // Charlie takes one lopsided set off Alpha.
        let games: BTreeMap<String, Game> = [
            ("g1", completed("Alpha", "Bravo", [(21, 15), (21, 17)])),
            ("g2", completed("Bravo", "Charlie", [(22, 20), (21, 20)])),
            ("g3", completed("Alpha", "Charlie", [(5, 21), (0, 0)])),
        ]
        .into_iter()
        .map(|(key, game)| (key.to_string(), game))
        .collect();

        (teams, games)
    }

    #[test]
    fn ranks_by_set_wins_then_differential() {
        let (teams, games) = fixture();
        let ranked = compute(&teams, &games);

        let names: Vec<&str> = ranked.iter().map(|s| s.team.as_str()).collect();
        // Alpha 2 wins -6, Bravo 2 wins -7, Charlie 1 win +13: set wins
        // outrank differential.
        assert_eq!(names, ["Alpha", "Bravo", "Charlie"]);

        assert_eq!(ranked[0].set_wins, 2);
        assert_eq!(ranked[2].set_wins, 1);
        assert!(ranked[2].point_differential > ranked[0].point_differential);
    }

    #[test]
    fn deterministic_over_repeated_calls() {
        let (teams, games) = fixture();
        assert_eq!(compute(&teams, &games), compute(&teams, &games));
    }

    #[test]
    fn counters_accumulate() {
        let (teams, games) = fixture();
        let ranked = compute(&teams, &games);

        let alpha = ranked.iter().find(|s| s.team == "Alpha").unwrap();
        assert_eq!(alpha.games_played, 2);
        assert_eq!(alpha.points_for, 21 + 21 + 5);
        assert_eq!(alpha.points_against, 15 + 17 + 21);
        assert_eq!(alpha.set_wins, 2);
        assert_eq!(alpha.set_losses, 1);
        assert_eq!(alpha.point_differential, 47 - 53);
    }

    #[test]
    fn incomplete_and_stale_games_are_skipped() {
        let (teams, mut games) = fixture();

        games.insert(
            "live".to_string(),
            Game::new("Alpha".to_string(), "Bravo".to_string(), Utc::now()),
        );
        games.insert(
            "stale".to_string(),
            completed("Alpha", "Deleted", [(21, 0), (21, 0)]),
        );

        let with_noise = compute(&teams, &games);
        let (teams, games) = fixture();
        assert_eq!(with_noise, compute(&teams, &games));
    }

    #[test]
    fn teams_without_games_get_zeroed_rows() {
        let teams: BTreeMap<String, Team> =
            [("Solo".to_string(), team("Solo"))].into_iter().collect();
        let ranked = compute(&teams, &BTreeMap::new());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].games_played, 0);
        assert_eq!(ranked[0].point_differential, 0);
    }
}
