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

//! The wire protocol: one request, reply, or event per line.
//!
//! Requests are a command word followed by an optional RON payload. Replies
//! are `= <command> [<ron>]` on success and `? <command> <kind> <reason>` on
//! failure. Events are `event <ron>` and always carry a full-state snapshot
//! of the affected aggregate, never a diff.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    game::{Game, Side},
    pool::Pool,
    team::Team,
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TeamCreate {
    pub name: String,
    #[serde(default)]
    pub player1: String,
    #[serde(default)]
    pub player2: String,
    #[serde(default)]
    pub pool: Pool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameCreate {
    pub team1: String,
    pub team2: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreAdjust {
    pub game_key: String,
    /// One-based set number.
    pub set: usize,
    pub side: Side,
    pub delta: i16,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameRef {
    pub game_key: String,
}

/// Reply payload for `create_game`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameCreated {
    pub game_key: String,
    pub game: Game,
}

/// One parsed request line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    AdjustScore(ScoreAdjust),
    CompleteGame(GameRef),
    CreateGame(GameCreate),
    ListGames,
    ListTeams,
    Login { password: String },
    Ping,
    RegisterTeam(TeamCreate),
    Reset,
    Standings,
}

impl Request {
    /// The command word echoed back in replies.
    #[must_use]
    pub fn command(&self) -> &'static str {
        match self {
            Self::AdjustScore(_) => "adjust_score",
            Self::CompleteGame(_) => "complete_game",
            Self::CreateGame(_) => "create_game",
            Self::ListGames => "list_games",
            Self::ListTeams => "list_teams",
            Self::Login { .. } => "login",
            Self::Ping => "ping",
            Self::RegisterTeam(_) => "register_team",
            Self::Reset => "reset",
            Self::Standings => "standings",
        }
    }
}

fn payload<'a, T: Deserialize<'a>>(command: &str, payload: &'a str) -> anyhow::Result<T> {
    ron::from_str(payload)
        .map_err(|err| anyhow::Error::msg(format!("{command}: bad payload: {err}")))
}

impl FromStr for Request {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim_start()),
            None => (line, ""),
        };

        match command {
            "adjust_score" => Ok(Self::AdjustScore(payload(command, rest)?)),
            "complete_game" => Ok(Self::CompleteGame(payload(command, rest)?)),
            "create_game" => Ok(Self::CreateGame(payload(command, rest)?)),
            "list_games" => Ok(Self::ListGames),
            "list_teams" => Ok(Self::ListTeams),
            "login" => Ok(Self::Login {
                password: rest.to_string(),
            }),
            "ping" => Ok(Self::Ping),
            "register_team" => Ok(Self::RegisterTeam(payload(command, rest)?)),
            "reset" => Ok(Self::Reset),
            "standings" => Ok(Self::Standings),
            _ => Err(anyhow::Error::msg(format!("unknown command: {command}"))),
        }
    }
}

/// A state-change notification pushed to every subscriber.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Init {
        teams: BTreeMap<String, Team>,
        games: BTreeMap<String, Game>,
    },
    TeamsUpdated {
        teams: BTreeMap<String, Team>,
    },
    GamesUpdated {
        games: BTreeMap<String, Game>,
    },
    ScoreUpdated {
        game_key: String,
        games: BTreeMap<String, Game>,
    },
    GameCompleted {
        games: BTreeMap<String, Game>,
    },
    TournamentReset,
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::TeamsUpdated { .. } => "teams_updated",
            Self::GamesUpdated { .. } => "games_updated",
            Self::ScoreUpdated { .. } => "score_updated",
            Self::GameCompleted { .. } => "game_completed",
            Self::TournamentReset => "tournament_reset",
        }
    }

    /// # Errors
    ///
    /// If the payload fails to serialize.
    pub fn to_line(&self) -> anyhow::Result<String> {
        Ok(format!("event {}", ron::ser::to_string(self)?))
    }

    /// # Errors
    ///
    /// If the line is not an event or fails to parse.
    pub fn from_line(line: &str) -> anyhow::Result<Self> {
        let Some(body) = line.trim().strip_prefix("event ") else {
            return Err(anyhow::Error::msg(format!("not an event line: {line}")));
        };

        Ok(ron::from_str(body)?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_team_with_spaces_in_names() {
        let request: Request =
            r#"register_team (name:"Net Gains",player1:"Sam Ash",player2:"Kit Reed",pool:B)"#
                .parse()
                .unwrap();

        let Request::RegisterTeam(create) = request else {
            panic!("wrong variant");
        };
        assert_eq!(create.name, "Net Gains");
        assert_eq!(create.pool, Pool::B);
    }

    #[test]
    fn payload_defaults_apply() {
        let request: Request = r#"register_team (name:"Solo")"#.parse().unwrap();

        let Request::RegisterTeam(create) = request else {
            panic!("wrong variant");
        };
        assert_eq!(create.player1, "");
        assert_eq!(create.pool, Pool::A);
    }

    #[test]
    fn parses_adjust_score() {
        let request: Request =
            r#"adjust_score (game_key:"A_vs_B_20250830_101500",set:2,side:team2,delta:-1)"#
                .parse()
                .unwrap();

        let Request::AdjustScore(adjust) = request else {
            panic!("wrong variant");
        };
        assert_eq!(adjust.set, 2);
        assert_eq!(adjust.side, Side::Team2);
        assert_eq!(adjust.delta, -1);
    }

    #[test]
    fn login_takes_rest_of_line_verbatim() {
        let request: Request = "login pass with spaces".parse().unwrap();
        assert_eq!(
            request,
            Request::Login {
                password: "pass with spaces".to_string()
            }
        );
    }

    #[test]
    fn bare_commands_parse() {
        for (line, expected) in [
            ("list_teams", Request::ListTeams),
            ("list_games", Request::ListGames),
            ("standings", Request::Standings),
            ("reset", Request::Reset),
            ("ping", Request::Ping),
        ] {
            assert_eq!(line.parse::<Request>().unwrap(), expected);
        }
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!("frobnicate".parse::<Request>().is_err());
        assert!("adjust_score not-ron".parse::<Request>().is_err());
    }

    #[test]
    fn event_lines_round_trip() {
        let event = Event::ScoreUpdated {
            game_key: "k".to_string(),
            games: BTreeMap::new(),
        };

        let line = event.to_line().unwrap();
        assert!(line.starts_with("event score_updated"));
        assert_eq!(Event::from_line(&line).unwrap(), event);

        let reset = Event::TournamentReset.to_line().unwrap();
        assert_eq!(reset, "event tournament_reset");
    }
}
