// new_episode.rs
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

use chrono::prelude::*;
use derive_builder::Builder;
use diesel::prelude::*;
use rfc822_sanitizer::parse_from_rfc2822_with_fallback as parse_rfc822;

use crate::errors::{DataError, EntryError};
use crate::models::Insert;
use crate::schema::episodes;
use crate::utils::{non_empty_description, url_cleaner};

#[derive(Insertable)]
#[diesel(table_name = episodes)]
#[derive(Debug, Clone, Builder, PartialEq)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub(crate) struct NewEpisode {
    feed_id: i32,
    guid: String,
    url: String,
    title: String,
    description: Option<String>,
    published: NaiveDateTime,
}

impl Insert<Option<i32>> for NewEpisode {
    type Error = DataError;

    /// `(feed_id, guid)` is the conflict key. An already present row is left
    /// untouched and `None` is returned; `played` in particular survives.
    fn insert(&self, con: &mut SqliteConnection) -> Result<Option<i32>, DataError> {
        use crate::schema::episodes::dsl::*;

        let written = diesel::insert_or_ignore_into(episodes)
            .values(self)
            .execute(con)?;

        if written == 0 {
            return Ok(None);
        }

        debug!("Inserted episode {:?}", self.title);
        episodes
            .filter(feed_id.eq(self.feed_id))
            .filter(guid.eq(&self.guid))
            .select(id)
            .get_result(con)
            .map(Some)
            .map_err(From::from)
    }
}

impl NewEpisode {
    /// Parses an `rss::Item` into a `NewEpisode` struct.
    ///
    /// Entries missing any of the required fields are rejected with the
    /// (soft) [`EntryError`] so the caller can skip them and carry on.
    pub(crate) fn new(item: &rss::Item, feed_id: i32) -> Result<Self, EntryError> {
        let guid = item
            .guid()
            .map(|g| g.value().trim())
            .filter(|g| !g.is_empty())
            .ok_or(EntryError::MissingGuid)?;

        let title = item
            .title()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(EntryError::MissingTitle)?;

        // The playable resource is the entry's first enclosure.
        // http://www.rssboard.org/rss-specification#ltenclosuregtSubelementOfLtitemgt
        let url = item
            .enclosure()
            .map(|enc| url_cleaner(enc.url().trim()))
            .ok_or(EntryError::MissingEnclosure)?;

        let pub_date = item.pub_date().ok_or(EntryError::MissingPubDate)?;
        let published = parse_rfc822(pub_date)
            .map_err(|_| EntryError::InvalidPubDate(pub_date.to_owned()))?
            .with_timezone(&Utc)
            .naive_utc();

        let description = non_empty_description(item.description());

        Ok(NewEpisodeBuilder::default()
            .feed_id(feed_id)
            .guid(guid)
            .url(url)
            .title(title)
            .description(description)
            .published(published)
            .build()
            .unwrap())
    }

    pub(crate) fn guid(&self) -> &str {
        &self.guid
    }
}
