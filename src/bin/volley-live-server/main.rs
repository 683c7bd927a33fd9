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

#![deny(clippy::expect_used)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;

use std::{
    collections::HashMap,
    fmt,
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    process::exit,
    str::FromStr,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use clap::Parser;
use log::{debug, error, info};
use old_rand::rngs::OsRng;
use password_hash::SaltString;
use volley_live::{
    Id,
    engine::Engine,
    error::TournamentError,
    hub::{BroadcastHub, Messenger},
    message::{Event, GameCreated, Request},
    store::{MemStore, RonStore, Store},
    utils,
};

use crate::command_line::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    let store: Box<dyn Store> = if args.ephemeral {
        Box::new(MemStore::default())
    } else {
        let folder = utils::create_data_folder()?;
        Box::new(RonStore::new(folder))
    };

    let admin_hash = hash_password(&args.admin_password)
        .ok_or_else(|| anyhow::Error::msg("failed to hash the admin password"))?;

    let mut server = Server {
        engine: Engine::load(store)?,
        hub: BroadcastHub::default(),
        clients: HashMap::new(),
        admin_hash,
    };

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || handle_error(server.handle_messages(&rx)));

    let mut address = format!("[::]:{}", args.port);
    let listener = match TcpListener::bind(&address) {
        Ok(listener) => listener,
        Err(error) => {
            error!("TcpListener::bind: {error}");

            address = format!("0.0.0.0:{}", args.port);
            TcpListener::bind(&address)?
        }
    };

    info!("listening on {address} ...");

    for (id, stream) in (1_u64..).zip(listener.incoming()) {
        let stream = match stream {
            Ok(stream) => stream,
            Err(error) => {
                error!("stream: {error}");
                continue;
            }
        };

        let tx = tx.clone();
        thread::spawn(move || {
            if let Err(error) = handle_connection(id, stream, &tx) {
                debug!("connection {id}: {error}");
            }
        });
    }

    Ok(())
}

/// Reads request lines off one socket and forwards them to the authority
/// thread; a companion thread writes replies and events back.
fn handle_connection(id: Id, stream: TcpStream, tx: &Sender<ServerMessage>) -> anyhow::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let (client_tx, client_rx) = mpsc::channel();

    tx.send(ServerMessage::Open { id, tx: client_tx })?;

    thread::spawn(move || {
        if let Err(error) = write_lines(stream, &client_rx) {
            debug!("write_lines {id}: {error}");
        }
    });

    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }

        let line = buf.trim();
        if line.is_empty() || line.chars().any(char::is_control) {
            break;
        }

        tx.send(ServerMessage::Request {
            id,
            line: line.to_string(),
        })?;
    }

    tx.send(ServerMessage::Close { id })?;
    Ok(())
}

fn write_lines(mut stream: TcpStream, client_rx: &Receiver<String>) -> anyhow::Result<()> {
    for mut line in client_rx {
        line.push('\n');
        stream.write_all(line.as_bytes())?;
    }

    Ok(())
}

fn handle_error<T, E: fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            error!("{error}");
            exit(1)
        }
    }
}

fn hash_password(password: &str) -> Option<String> {
    let ctx = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);
    Some(
        ctx.hash_password(password.as_bytes(), &salt)
            .ok()?
            .to_string(),
    )
}

enum ServerMessage {
    Open { id: Id, tx: Sender<String> },
    Request { id: Id, line: String },
    Close { id: Id },
}

struct Client {
    tx: Sender<String>,
    admin: bool,
}

/// Single-writer authority: one instance, owned by one thread, mutating the
/// engine in the order requests arrive. Fan-out goes through per-client
/// channels so a slow viewer never stalls scoring.
struct Server {
    engine: Engine,
    hub: BroadcastHub,
    clients: HashMap<Id, Client>,
    admin_hash: String,
}

impl Server {
    fn handle_messages(&mut self, rx: &Receiver<ServerMessage>) -> anyhow::Result<()> {
        for message in rx {
            match message {
                ServerMessage::Open { id, tx } => {
                    let messenger = Messenger::new(tx.clone());
                    self.clients.insert(id, Client { tx, admin: false });

                    // The snapshot is taken and delivered on this thread,
                    // so it cannot interleave with a mutation.
                    let init = Event::Init {
                        teams: self.engine.teams(),
                        games: self.engine.games(),
                    };
                    self.hub.subscribe(id, messenger, &init)?;

                    info!("{id} connected, {} clients", self.clients.len());
                }
                ServerMessage::Request { id, line } => self.handle_request(id, &line)?,
                ServerMessage::Close { id } => {
                    self.hub.unsubscribe(id);
                    self.clients.remove(&id);
                    info!("{id} disconnected, {} clients", self.clients.len());
                }
            }
        }

        Ok(())
    }

    /// Replies to the caller first, then broadcasts; the engine has already
    /// written durably by the time either happens, so subscribers never
    /// hear about state that didn't persist.
    fn handle_request(&mut self, id: Id, line: &str) -> anyhow::Result<()> {
        let request = match Request::from_str(line) {
            Ok(request) => request,
            Err(error) => {
                debug!("{id}: {error}");
                self.reply(id, &format!("? _ bad_request {error}"));
                return Ok(());
            }
        };

        debug!("{id} {}", request.command());

        match request {
            Request::Ping => self.reply(id, "= pong"),
            Request::Login { password } => self.login(id, &password),
            Request::ListTeams => {
                let teams = ron::ser::to_string(&self.engine.teams())?;
                self.reply(id, &format!("= list_teams {teams}"));
            }
            Request::ListGames => {
                let games = ron::ser::to_string(&self.engine.games())?;
                self.reply(id, &format!("= list_games {games}"));
            }
            Request::Standings => {
                let standings = ron::ser::to_string(&self.engine.standings())?;
                self.reply(id, &format!("= standings {standings}"));
            }
            Request::RegisterTeam(create) => {
                if !self.admin(id) {
                    self.reply(id, "? register_team unauthorized admin login required");
                    return Ok(());
                }

                match self.engine.register_team(create) {
                    Ok(team) => {
                        let team = ron::ser::to_string(&team)?;
                        self.reply(id, &format!("= register_team {team}"));
                        self.hub.publish(&Event::TeamsUpdated {
                            teams: self.engine.teams(),
                        })?;
                    }
                    Err(error) => self.fail(id, "register_team", &error),
                }
            }
            Request::CreateGame(create) => match self.engine.create_game(
                &create.team1,
                &create.team2,
                Utc::now(),
            ) {
                Ok((game_key, game)) => {
                    let created = ron::ser::to_string(&GameCreated { game_key, game })?;
                    self.reply(id, &format!("= create_game {created}"));
                    self.hub.publish(&Event::GamesUpdated {
                        games: self.engine.games(),
                    })?;
                }
                Err(error) => self.fail(id, "create_game", &error),
            },
            Request::AdjustScore(adjust) => match self.engine.adjust_score(
                &adjust.game_key,
                adjust.set,
                adjust.side,
                adjust.delta,
            ) {
                Ok(game) => {
                    let game = ron::ser::to_string(&game)?;
                    self.reply(id, &format!("= adjust_score {game}"));
                    self.hub.publish(&Event::ScoreUpdated {
                        game_key: adjust.game_key,
                        games: self.engine.games(),
                    })?;
                }
                Err(error) => self.fail(id, "adjust_score", &error),
            },
            Request::CompleteGame(game_ref) => {
                match self.engine.complete_game(&game_ref.game_key, Utc::now()) {
                    Ok(winner) => {
                        let winner = ron::ser::to_string(&winner)?;
                        self.reply(id, &format!("= complete_game {winner}"));
                        self.hub.publish(&Event::GameCompleted {
                            games: self.engine.games(),
                        })?;
                    }
                    Err(error) => self.fail(id, "complete_game", &error),
                }
            }
            Request::Reset => {
                if !self.admin(id) {
                    self.reply(id, "? reset unauthorized admin login required");
                    return Ok(());
                }

                match self.engine.reset_all() {
                    Ok(()) => {
                        self.reply(id, "= reset");
                        self.hub.publish(&Event::TournamentReset)?;
                    }
                    Err(error) => self.fail(id, "reset", &error),
                }
            }
        }

        Ok(())
    }

    fn login(&mut self, id: Id, password: &str) {
        let verified = PasswordHash::try_from(self.admin_hash.as_str()).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        });

        if verified {
            if let Some(client) = self.clients.get_mut(&id) {
                client.admin = true;
            }

            info!("{id} admin login");
            self.reply(id, "= login");
        } else {
            info!("{id} failed admin login");
            self.reply(id, "? login unauthorized invalid credentials");
        }
    }

    fn admin(&self, id: Id) -> bool {
        self.clients.get(&id).is_some_and(|client| client.admin)
    }

    fn reply(&self, id: Id, line: &str) {
        if let Some(client) = self.clients.get(&id) {
            let _ok = client.tx.send(line.to_string());
        }
    }

    fn fail(&self, id: Id, command: &str, error: &TournamentError) {
        debug!("{id} {command}: {error}");
        self.reply(id, &format!("? {command} {} {error}", error.kind()));
    }
}
