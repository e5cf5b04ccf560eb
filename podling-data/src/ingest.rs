// ingest.rs
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

//! Reconcile parsed feed entries into durable episode rows.
//!
//! Ingestion is idempotent: `(feed_id, guid)` is the conflict key and a row
//! that already exists is never touched again. Malformed entries are skipped
//! with a warning; only feed-level failures abort a sync.

use diesel::SqliteConnection;

use crate::cache::Entity;
use crate::database::connection;
use crate::errors::DataError;
use crate::models::{Episode, Feed, Insert, NewEpisode};

/// Insert one parsed entry under `feed.id()`.
///
/// Returns the (cached) new `Episode`, or `None` when a row with the same
/// `(feed, guid)` already exists or the entry is malformed.
pub fn ingest_entry(item: &rss::Item, feed: &Feed) -> Result<Option<Entity<Episode>>, DataError> {
    let db = connection();
    let mut con = db.get()?;

    let new_id = ingest_entry_on(&mut con, item, feed.id())?;
    new_id.map(Episode::get).transpose()
}

/// Apply [`ingest_entry`] to every entry, in source order, on the caller's
/// connection. Returns how many rows were created.
pub(crate) fn ingest_all_on(
    con: &mut SqliteConnection,
    items: &[rss::Item],
    feed_id: i32,
) -> Result<usize, DataError> {
    let mut inserted = 0;
    for item in items {
        if ingest_entry_on(con, item, feed_id)?.is_some() {
            inserted += 1;
        }
    }

    if inserted > 0 {
        info!("Ingested {} new episodes for feed {}.", inserted, feed_id);
    }
    Ok(inserted)
}

fn ingest_entry_on(
    con: &mut SqliteConnection,
    item: &rss::Item,
    feed_id: i32,
) -> Result<Option<i32>, DataError> {
    let episode = match NewEpisode::new(item, feed_id) {
        Ok(episode) => episode,
        Err(err) => {
            warn!("Skipping malformed entry of feed {}: {}", feed_id, err);
            return Ok(None);
        }
    };

    episode.insert(con)
}
