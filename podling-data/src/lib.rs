// lib.rs
//
// Copyright 2025 Podling Developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

// Enable lint group collections
#![warn(nonstandard_style, unused)]
// standalone lints
#![warn(
    non_shorthand_field_patterns,
    overflowing_literals,
    unconditional_recursion,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    elided_lifetime_in_paths
)]

//! Data access layer of Podling: tracked feeds, their episodes and the
//! machinery that keeps both in sync with the remote RSS documents.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate log;

pub mod cache;
pub mod database;
#[allow(missing_docs)]
pub mod dbqueries;
#[allow(missing_docs)]
pub mod errors;
mod fetcher;
pub mod ingest;
pub(crate) mod models;
mod schema;
pub mod syncer;
pub mod utils;

pub use crate::cache::Entity;
pub use crate::fetcher::{Fetch, FetchOutcome, FetchedDocument, HttpFetcher, Validators};
pub use crate::models::Save;
pub use crate::models::{Episode, Feed};
pub use crate::syncer::SyncOutcome;

// Set the user agent, some feed hosts still check it.
// Keep this in sync with Tor-browser releases.
/// The user-agent to be used for all the requests.
/// It originates from the Tor-browser UA.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; rv:52.0) Gecko/20100101 Firefox/52.0";

/// [XDG Base Directory](https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html) Paths.
#[allow(missing_debug_implementations)]
pub mod xdg_dirs {
    use std::path::PathBuf;
    use std::sync::LazyLock;

    pub(crate) static PODLING_XDG: LazyLock<xdg::BaseDirectories> =
        LazyLock::new(|| xdg::BaseDirectories::with_prefix("podling").unwrap());

    /// XDG_DATA Directory `PathBuf`.
    pub static PODLING_DATA: LazyLock<PathBuf> = LazyLock::new(|| {
        PODLING_XDG
            .create_data_directory(PODLING_XDG.get_data_home())
            .unwrap()
    });
}
