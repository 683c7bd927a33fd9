//! A state engine and TCP server for running a small round-robin volleyball
//! tournament: team registration, live two-set game scoring, winner
//! determination, pool standings, and real-time fan-out of every score
//! change to connected viewers.
//!
//! The authoritative state lives in [`engine::Engine`]; the wire protocol is
//! defined in [`message`]; durable storage is the [`store::Store`] seam.

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

#![deny(clippy::panic)]

pub mod engine;
pub mod error;
pub mod game;
pub mod hub;
pub mod message;
pub mod pool;
pub mod standings;
pub mod store;
pub mod team;
pub mod utils;

/// Identifies one client connection for the lifetime of the process.
pub type Id = u64;

pub const HOME: &str = "volley-live";
pub const SERVER_PORT: u16 = 49155;

/// Hard cap on registered teams.
pub const MAX_TEAMS: usize = 15;

/// Every game is exactly this many sets, fixed at creation.
pub const SETS_PER_GAME: usize = 2;

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Licensed under the AGPLv3"
);

pub const COPYRIGHT: &str = r".SH COPYRIGHT
This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";
