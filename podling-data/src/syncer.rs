// syncer.rs
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

//! Keep tracked feeds in agreement with their remote documents.
//!
//! `url -> GET -> revalidate -> parse -> feed row + episode rows`, with the
//! row updates of a single call committed as one transaction. The live `Feed`
//! instance is only touched after the commit, so a failed sync leaves both
//! the rows and every handle to the cached object exactly as they were.

use chrono::prelude::*;
use diesel::prelude::*;
use reqwest::StatusCode;
use rss::Channel;
use url::Url;

use crate::cache::Entity;
use crate::database::connection;
use crate::dbqueries;
use crate::errors::{DataError, SyncError};
use crate::fetcher::{Fetch, FetchOutcome, Validators};
use crate::ingest;
use crate::models::{Feed, Insert, NewFeed, Save};
use crate::utils::non_empty_description;

/// What a successful [`sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote reported 304; only the sync timestamp moved.
    NotModified,
    /// A fresh document was parsed and reconciled.
    Updated {
        /// Episode rows created by this sync.
        new_episodes: usize,
    },
}

/// Start tracking the feed at `url`.
///
/// Fetches and parses the document, persists the feed row together with its
/// episodes in one transaction and returns the cached `Feed`.
pub fn add<F: Fetch>(fetcher: &F, url: &str) -> Result<Entity<Feed>, SyncError> {
    let url = Url::parse(url)?;

    // Duplicates are checked against storage before any network access.
    if dbqueries::feed_exists(url.as_str())? {
        return Err(SyncError::DuplicateFeed(url.into()));
    }

    let doc = match fetcher.fetch(url.as_str(), Validators::default())? {
        FetchOutcome::Fetched(doc) => doc,
        FetchOutcome::NotModified => {
            // 304 even though we presented no validators.
            return Err(SyncError::HttpStatus {
                url: url.into(),
                status: StatusCode::NOT_MODIFIED,
            });
        }
    };

    let channel = Channel::read_from(doc.body.as_slice())?;
    let new_feed = NewFeed::new(&url, &channel, &doc);

    let db = connection();
    let mut con = db.get().map_err(DataError::from)?;
    let feed_id = con.transaction::<i32, DataError, _>(|con| {
        let feed_id = new_feed.insert(con)?;
        ingest::ingest_all_on(con, channel.items(), feed_id)?;
        Ok(feed_id)
    })?;

    info!("Started tracking {}", url);
    Feed::get(feed_id).map_err(From::from)
}

/// Synchronize one tracked feed with its remote document.
///
/// The feed's stored validators are presented for revalidation; a 304 answer
/// costs neither a parse nor any ingestion.
pub fn sync<F: Fetch>(fetcher: &F, feed: &Entity<Feed>) -> Result<SyncOutcome, SyncError> {
    let (feed_id, url, etag, modified) = {
        let feed = feed.read().expect("feed lock poisoned");
        (
            feed.id(),
            feed.url().to_owned(),
            feed.etag().map(str::to_owned),
            feed.modified().map(str::to_owned),
        )
    };

    let validators = Validators {
        etag: etag.as_deref(),
        modified: modified.as_deref(),
    };

    match fetcher.fetch(&url, validators)? {
        FetchOutcome::NotModified => {
            // Only the sync timestamp moves. Title, validators and the
            // episode set stay as they are.
            let mut feed = feed.write().expect("feed lock poisoned");
            feed.set_updated(Some(Utc::now().naive_utc()));
            feed.save()?;

            info!("Feed {} is up to date", url);
            Ok(SyncOutcome::NotModified)
        }
        FetchOutcome::Fetched(doc) => {
            let channel = Channel::read_from(doc.body.as_slice())?;

            // Stage the metadata update on a copy; the live instance is not
            // touched until the row and the episodes have committed.
            let mut staged = feed.read().expect("feed lock poisoned").clone();
            staged.set_title(Some(channel.title().trim().to_owned()));
            staged.set_description(non_empty_description(Some(channel.description())));
            staged.set_etag(doc.etag);
            staged.set_modified(doc.modified);
            staged.set_updated(Some(Utc::now().naive_utc()));

            let db = connection();
            let mut con = db.get().map_err(DataError::from)?;
            let new_episodes = con.transaction::<usize, DataError, _>(|con| {
                diesel::update(&staged).set(&staged).execute(con)?;
                ingest::ingest_all_on(con, channel.items(), feed_id)
            })?;

            *feed.write().expect("feed lock poisoned") = staged;

            info!("Synced {}: {} new episodes", url, new_episodes);
            Ok(SyncOutcome::Updated { new_episodes })
        }
    }
}

/// Sync every given feed in turn, logging failures instead of aborting.
///
/// One feed serving garbage should not keep the rest from updating.
pub fn refresh<F: Fetch>(fetcher: &F, feeds: &[Entity<Feed>]) {
    for feed in feeds {
        let url = feed.read().expect("feed lock poisoned").url().to_owned();
        match sync(fetcher, feed) {
            Ok(SyncOutcome::NotModified) => debug!("{} not modified", url),
            Ok(SyncOutcome::Updated { new_episodes }) => {
                debug!("{}: {} new episodes", url, new_episodes)
            }
            Err(err) => error!("Error while syncing {}: {}", url, err),
        }
    }
}
