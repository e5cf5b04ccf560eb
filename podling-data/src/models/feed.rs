// feed.rs
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

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SaveChangesDsl;

use crate::cache::{self, Entity};
use crate::database::connection;
use crate::dbqueries;
use crate::errors::DataError;
use crate::models::Save;
use crate::schema::feeds;

#[derive(Queryable, Identifiable, AsChangeset, PartialEq)]
#[diesel(table_name = feeds)]
#[diesel(treat_none_as_null = true)]
#[derive(Debug, Clone)]
/// Diesel Model of the feeds table.
pub struct Feed {
    id: i32,
    url: String,
    title: Option<String>,
    description: Option<String>,
    etag: Option<String>,
    modified: Option<String>,
    updated: Option<NaiveDateTime>,
}

impl Save<Feed> for Feed {
    type Error = DataError;

    fn save(&self) -> Result<Feed, Self::Error> {
        let db = connection();
        let mut con = db.get()?;

        self.save_changes::<Feed>(&mut con).map_err(From::from)
    }
}

impl Feed {
    /// Get the feed `id` column.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Location of the remote feed document. Unique across all feeds.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last-known title of the remote feed.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub(crate) fn set_title(&mut self, value: Option<String>) {
        self.title = value;
    }

    /// Last-known description of the remote feed.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn set_description(&mut self, value: Option<String>) {
        self.description = value;
    }

    /// The `ETag` header the remote returned for the current representation.
    ///
    /// See [RFC 7232](https://tools.ietf.org/html/rfc7232#section-2.3) for more.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub(crate) fn set_etag(&mut self, value: Option<String>) {
        self.etag = value;
    }

    /// The `Last-Modified` header the remote returned for the current
    /// representation.
    ///
    /// See [RFC 7232](https://tools.ietf.org/html/rfc7232#section-2.2) for more.
    pub fn modified(&self) -> Option<&str> {
        self.modified.as_deref()
    }

    pub(crate) fn set_modified(&mut self, value: Option<String>) {
        self.modified = value;
    }

    /// When the last successful synchronization attempt finished.
    ///
    /// Set even when the remote reported not-modified.
    pub fn updated(&self) -> Option<NaiveDateTime> {
        self.updated
    }

    pub(crate) fn set_updated(&mut self, value: Option<NaiveDateTime>) {
        self.updated = value;
    }

    /// The unique live instance for the given feed id.
    pub fn get(id: i32) -> Result<Entity<Feed>, DataError> {
        cache::FEEDS.get_or_create(id, dbqueries::get_feed_from_id)
    }

    /// Every tracked feed, ordered by id.
    pub fn get_all() -> Result<Vec<Entity<Feed>>, DataError> {
        dbqueries::get_feed_ids()?.into_iter().map(Feed::get).collect()
    }

    /// Character count of the longest feed title. Presentational helper for
    /// column layout.
    pub fn max_title_length() -> Result<usize, DataError> {
        dbqueries::max_feed_title_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    use crate::database::{test_lock, truncate_db};
    use crate::models::NewFeedBuilder;

    use std::sync::Arc;

    #[test]
    fn test_get_is_identity_cached() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        let id = dbqueries::insert_feed_for_test(
            NewFeedBuilder::default()
                .url("https://example.com/cached.xml")
                .title(Some("Cached".to_string()))
                .build()
                .unwrap(),
        )?;

        let first = Feed::get(id)?;
        let second = Feed::get(id)?;
        assert!(Arc::ptr_eq(&first, &second));

        // A write through one handle is immediately visible through the other.
        first
            .write()
            .unwrap()
            .set_title(Some("Renamed".to_string()));
        assert_eq!(second.read().unwrap().title(), Some("Renamed"));
        Ok(())
    }

    #[test]
    fn test_save_roundtrip() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        let id = dbqueries::insert_feed_for_test(
            NewFeedBuilder::default()
                .url("https://example.com/roundtrip.xml")
                .build()
                .unwrap(),
        )?;

        {
            let feed = Feed::get(id)?;
            let mut feed = feed.write().unwrap();
            feed.set_etag(Some("W/\"123\"".to_string()));
            feed.save()?;
        }

        let row = dbqueries::get_feed_from_id(id)?;
        assert_eq!(row.etag(), Some("W/\"123\""));
        Ok(())
    }

    #[test]
    fn test_max_title_length() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        assert_eq!(Feed::max_title_length()?, 0);

        for (url, title) in [
            ("https://example.com/a.xml", "short"),
            ("https://example.com/b.xml", "a longer title"),
        ] {
            dbqueries::insert_feed_for_test(
                NewFeedBuilder::default()
                    .url(url)
                    .title(Some(title.to_string()))
                    .build()
                    .unwrap(),
            )?;
        }

        assert_eq!(Feed::max_title_length()?, "a longer title".chars().count());
        Ok(())
    }
}
