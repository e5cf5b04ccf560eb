// mod.rs
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

mod new_episode;
mod new_feed;

mod episode;
mod feed;

use diesel::SqliteConnection;

pub(crate) use self::new_episode::NewEpisode;
pub(crate) use self::new_feed::NewFeed;

#[cfg(test)]
pub(crate) use self::new_episode::NewEpisodeBuilder;
#[cfg(test)]
pub(crate) use self::new_feed::NewFeedBuilder;

pub use self::episode::Episode;
pub use self::feed::Feed;

/// Write a new row on the given connection.
///
/// Takes the caller's connection so `add`/`sync` can wrap a whole batch in one
/// transaction.
pub(crate) trait Insert<T> {
    type Error;

    fn insert(&self, con: &mut SqliteConnection) -> Result<T, Self::Error>;
}

/// Helper trait to easily save/"sync" the current state of a model to
/// the Database.
pub trait Save<T> {
    /// The Error type to be returned.
    type Error;
    /// Save the in-memory state of self to the corresponding db row.
    fn save(&self) -> Result<T, Self::Error>;
}
