// dbqueries.rs
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

//! Random CRUD helper functions.

use diesel::prelude::*;

use diesel::dsl::exists;
use diesel::select;

use crate::database::connection;
use crate::errors::DataError;
use crate::models::*;

pub fn get_feed_from_id(feed_id: i32) -> Result<Feed, DataError> {
    use crate::schema::feeds::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    feeds
        .filter(id.eq(feed_id))
        .get_result::<Feed>(&mut con)
        .map_err(From::from)
}

pub fn get_feed_ids() -> Result<Vec<i32>, DataError> {
    use crate::schema::feeds::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    feeds
        .select(id)
        .order(id.asc())
        .load::<i32>(&mut con)
        .map_err(From::from)
}

pub fn feed_exists(url_: &str) -> Result<bool, DataError> {
    use crate::schema::feeds::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    select(exists(feeds.filter(url.eq(url_))))
        .get_result(&mut con)
        .map_err(From::from)
}

/// Character count of the longest feed title.
pub fn max_feed_title_length() -> Result<usize, DataError> {
    use crate::schema::feeds::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    let titles = feeds.select(title).load::<Option<String>>(&mut con)?;
    Ok(titles
        .iter()
        .flatten()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0))
}

pub fn get_episode_from_id(ep_id: i32) -> Result<Episode, DataError> {
    use crate::schema::episodes::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    episodes
        .filter(id.eq(ep_id))
        .get_result::<Episode>(&mut con)
        .map_err(From::from)
}

pub fn get_episode_ids() -> Result<Vec<i32>, DataError> {
    use crate::schema::episodes::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    episodes
        .select(id)
        .order((published.asc(), id.asc()))
        .load::<i32>(&mut con)
        .map_err(From::from)
}

pub fn get_episode_ids_by_feed(feed_id_: i32) -> Result<Vec<i32>, DataError> {
    use crate::schema::episodes::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    episodes
        .select(id)
        .filter(feed_id.eq(feed_id_))
        .order((published.asc(), id.asc()))
        .load::<i32>(&mut con)
        .map_err(From::from)
}

pub fn get_unplayed_episode_ids_by_feed(feed_id_: i32) -> Result<Vec<i32>, DataError> {
    use crate::schema::episodes::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    episodes
        .select(id)
        .filter(feed_id.eq(feed_id_))
        .filter(played.is_null())
        .order((published.asc(), id.asc()))
        .load::<i32>(&mut con)
        .map_err(From::from)
}

pub fn get_episode_id_by_guid(feed_id_: i32, guid_: &str) -> Result<Option<i32>, DataError> {
    use crate::schema::episodes::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    episodes
        .select(id)
        .filter(feed_id.eq(feed_id_))
        .filter(guid.eq(guid_))
        .get_result::<i32>(&mut con)
        .optional()
        .map_err(From::from)
}

pub fn episode_exists(feed_id_: i32, guid_: &str) -> Result<bool, DataError> {
    use crate::schema::episodes::dsl::*;
    let db = connection();
    let mut con = db.get()?;

    select(exists(
        episodes.filter(feed_id.eq(feed_id_)).filter(guid.eq(guid_)),
    ))
    .get_result(&mut con)
    .map_err(From::from)
}

#[cfg(test)]
pub(crate) fn insert_feed_for_test(feed: NewFeed) -> Result<i32, DataError> {
    let db = connection();
    let mut con = db.get()?;

    feed.insert(&mut con)
}

#[cfg(test)]
pub(crate) fn insert_episode_for_test(episode: NewEpisode) -> Result<Option<i32>, DataError> {
    let db = connection();
    let mut con = db.get()?;

    episode.insert(&mut con)
}
