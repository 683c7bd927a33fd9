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

use std::io::Write as _;

use clap::{CommandFactory, Parser};
use volley_live::{COPYRIGHT, LONG_VERSION, SERVER_PORT};

/// Volleyball Tournament Server
///
/// This is a TCP server that listens for scorekeeper and viewer
/// connections.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Volleyball Tournament Server")]
pub(crate) struct Args {
    /// The shared admin password for registration and reset
    #[arg(long, env = "VOLLEY_ADMIN_PASSWORD", default_value = "volleyball123")]
    pub admin_password: String,

    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Keep all state in memory, skipping the data files
    #[arg(long)]
    pub ephemeral: bool,

    /// The TCP port to listen on
    #[arg(long, default_value_t = SERVER_PORT)]
    pub port: u16,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command()
            .name("volley-live-server")
            .long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-08-30");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("volley-live-server.1", buffer)?;
        Ok(())
    }
}
