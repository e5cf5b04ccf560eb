// new_feed.rs
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
use url::Url;

use crate::errors::DataError;
use crate::fetcher::FetchedDocument;
use crate::models::Insert;
use crate::schema::feeds;
use crate::utils::non_empty_description;

#[derive(Insertable)]
#[diesel(table_name = feeds)]
#[derive(Debug, Clone, Default, Builder, PartialEq)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub(crate) struct NewFeed {
    url: String,
    title: Option<String>,
    description: Option<String>,
    etag: Option<String>,
    modified: Option<String>,
    updated: Option<NaiveDateTime>,
}

impl Insert<i32> for NewFeed {
    type Error = DataError;

    fn insert(&self, con: &mut SqliteConnection) -> Result<i32, DataError> {
        use crate::schema::feeds::dsl::*;

        info!("Inserting feed {}", self.url);
        diesel::insert_into(feeds).values(self).execute(con)?;

        // `url` is unique, so this is the row that was just written.
        feeds
            .filter(url.eq(&self.url))
            .select(id)
            .get_result(con)
            .map_err(From::from)
    }
}

impl NewFeed {
    /// Assemble a feed row from a freshly fetched and parsed document.
    pub(crate) fn new(url: &Url, chan: &rss::Channel, doc: &FetchedDocument) -> NewFeed {
        NewFeedBuilder::default()
            .url(url.to_string())
            .title(Some(chan.title().trim().to_owned()))
            .description(non_empty_description(Some(chan.description())))
            .etag(doc.etag.clone())
            .modified(doc.modified.clone())
            .updated(Some(Utc::now().naive_utc()))
            .build()
            .unwrap()
    }
}
