use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{game::Game, team::Team};

const TEAMS_FILE: &str = "teams.ron";
const GAMES_FILE: &str = "games.ron";

/// Durable key-value collaborator for teams and games.
///
/// Upserts are idempotent: saving the same record twice with identical data
/// is a no-op as far as the loaded state is concerned. The engine is the
/// only caller and enforces all domain invariants before writing.
pub trait Store: Send {
    /// # Errors
    ///
    /// If the backing storage cannot be read or decoded.
    fn load_teams(&self) -> anyhow::Result<BTreeMap<String, Team>>;

    /// # Errors
    ///
    /// If the backing storage cannot be read or decoded.
    fn load_games(&self) -> anyhow::Result<BTreeMap<String, Game>>;

    /// # Errors
    ///
    /// If the write fails.
    fn save_team(&mut self, team: &Team) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// If the write fails. Deleting an absent team is not an error.
    fn delete_team(&mut self, name: &str) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// If the write fails.
    fn save_game(&mut self, key: &str, game: &Game) -> anyhow::Result<()>;

    /// Deletes every team and game.
    ///
    /// # Errors
    ///
    /// If the wipe fails.
    fn wipe(&mut self) -> anyhow::Result<()>;
}

/// File-backed store: one RON file per aggregate under the data folder.
pub struct RonStore {
    folder: PathBuf,
}

impl RonStore {
    #[must_use]
    pub fn new(folder: PathBuf) -> Self {
        Self { folder }
    }

    fn read_map<T: DeserializeOwned>(path: &Path) -> anyhow::Result<BTreeMap<String, T>> {
        match fs::read_to_string(path) {
            Ok(string) => ron::from_str(&string)
                .map_err(|err| anyhow::Error::msg(format!("RON: {}: {err}", path.display()))),
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Ok(BTreeMap::new()),
                _ => Err(err.into()),
            },
        }
    }

    fn write_map<T: Serialize>(path: &Path, map: &BTreeMap<String, T>) -> anyhow::Result<()> {
        let string = ron::ser::to_string_pretty(map, ron::ser::PrettyConfig::default())?;
        fs::write(path, string)?;
        Ok(())
    }

    fn teams_file(&self) -> PathBuf {
        self.folder.join(TEAMS_FILE)
    }

    fn games_file(&self) -> PathBuf {
        self.folder.join(GAMES_FILE)
    }
}

impl Store for RonStore {
    fn load_teams(&self) -> anyhow::Result<BTreeMap<String, Team>> {
        Self::read_map(&self.teams_file())
    }

    fn load_games(&self) -> anyhow::Result<BTreeMap<String, Game>> {
        Self::read_map(&self.games_file())
    }

    fn save_team(&mut self, team: &Team) -> anyhow::Result<()> {
        let path = self.teams_file();
        let mut teams = Self::read_map::<Team>(&path)?;
        teams.insert(team.name.clone(), team.clone());
        Self::write_map(&path, &teams)
    }

    fn delete_team(&mut self, name: &str) -> anyhow::Result<()> {
        let path = self.teams_file();
        let mut teams = Self::read_map::<Team>(&path)?;
        teams.remove(name);
        Self::write_map(&path, &teams)
    }

    fn save_game(&mut self, key: &str, game: &Game) -> anyhow::Result<()> {
        let path = self.games_file();
        let mut games = Self::read_map::<Game>(&path)?;
        games.insert(key.to_string(), game.clone());
        Self::write_map(&path, &games)
    }

    fn wipe(&mut self) -> anyhow::Result<()> {
        for path in [self.teams_file(), self.games_file()] {
            if let Err(err) = fs::remove_file(&path)
                && err.kind() != ErrorKind::NotFound
            {
                return Err(err.into());
            }
        }

        Ok(())
    }
}

/// In-memory store for `--ephemeral` runs and tests.
#[derive(Default)]
pub struct MemStore {
    teams: BTreeMap<String, Team>,
    games: BTreeMap<String, Game>,
}

impl Store for MemStore {
    fn load_teams(&self) -> anyhow::Result<BTreeMap<String, Team>> {
        Ok(self.teams.clone())
    }

    fn load_games(&self) -> anyhow::Result<BTreeMap<String, Game>> {
        Ok(self.games.clone())
    }

    fn save_team(&mut self, team: &Team) -> anyhow::Result<()> {
        self.teams.insert(team.name.clone(), team.clone());
        Ok(())
    }

    fn delete_team(&mut self, name: &str) -> anyhow::Result<()> {
        self.teams.remove(name);
        Ok(())
    }

    fn save_game(&mut self, key: &str, game: &Game) -> anyhow::Result<()> {
        self.games.insert(key.to_string(), game.clone());
        Ok(())
    }

    fn wipe(&mut self) -> anyhow::Result<()> {
        self.teams.clear();
        self.games.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{game::Game, pool::Pool};

    struct TempFolder(PathBuf);

    impl TempFolder {
        fn new() -> Self {
            let folder = std::env::temp_dir().join(format!(
                "volley-live-test-{:08x}",
                rand::random::<u32>()
            ));
            fs::create_dir_all(&folder).unwrap();
            Self(folder)
        }
    }

    impl Drop for TempFolder {
        fn drop(&mut self) {
            let _ok = fs::remove_dir_all(&self.0);
        }
    }

    fn team(name: &str) -> Team {
        Team {
            name: name.to_string(),
            player1: "P1".to_string(),
            player2: "P2".to_string(),
            pool: Pool::C,
        }
    }

    #[test]
    fn empty_folder_loads_empty_maps() {
        let folder = TempFolder::new();
        let store = RonStore::new(folder.0.clone());

        assert!(store.load_teams().unwrap().is_empty());
        assert!(store.load_games().unwrap().is_empty());
    }

    #[test]
    fn teams_and_games_survive_the_round_trip() {
        let folder = TempFolder::new();
        let mut store = RonStore::new(folder.0.clone());

        store.save_team(&team("Aces")).unwrap();
        let game = Game::new("Aces".to_string(), "Blockers".to_string(), Utc::now());
        store.save_game("k", &game).unwrap();

        // Saving identical data again is an idempotent upsert.
        store.save_team(&team("Aces")).unwrap();
        store.save_game("k", &game).unwrap();

        assert_eq!(store.load_teams().unwrap().len(), 1);
        assert_eq!(store.load_games().unwrap().get("k").unwrap(), &game);
    }

    #[test]
    fn delete_team_and_wipe() {
        let folder = TempFolder::new();
        let mut store = RonStore::new(folder.0.clone());

        store.save_team(&team("Aces")).unwrap();
        store.save_team(&team("Blockers")).unwrap();

        store.delete_team("Aces").unwrap();
        store.delete_team("Aces").unwrap();
        assert_eq!(store.load_teams().unwrap().len(), 1);

        store.wipe().unwrap();
        store.wipe().unwrap();
        assert!(store.load_teams().unwrap().is_empty());
        assert!(store.load_games().unwrap().is_empty());
    }
}
