// episode.rs
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
use diesel::prelude::*;
use diesel::SaveChangesDsl;

use crate::cache::{self, Entity};
use crate::database::connection;
use crate::dbqueries;
use crate::errors::DataError;
use crate::models::{Feed, Save};
use crate::schema::episodes;

#[derive(Queryable, Identifiable, AsChangeset, Associations, PartialEq)]
#[diesel(table_name = episodes)]
#[diesel(treat_none_as_null = true)]
#[diesel(belongs_to(Feed, foreign_key = feed_id))]
#[derive(Debug, Clone)]
/// Diesel Model of the episodes table.
pub struct Episode {
    id: i32,
    feed_id: i32,
    guid: String,
    url: String,
    title: String,
    description: Option<String>,
    published: NaiveDateTime,
    played: Option<NaiveDateTime>,
}

impl Save<Episode> for Episode {
    type Error = DataError;

    fn save(&self) -> Result<Episode, Self::Error> {
        let db = connection();
        let mut con = db.get()?;

        self.save_changes::<Episode>(&mut con).map_err(From::from)
    }
}

impl Episode {
    /// Get the episode `id` column.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// `Feed` table foreign key.
    pub fn feed_id(&self) -> i32 {
        self.feed_id
    }

    /// The owning feed, resolved through the identity cache.
    pub fn feed(&self) -> Result<Entity<Feed>, DataError> {
        Feed::get(self.feed_id)
    }

    /// Source-provided identifier, unique within the owning feed.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Location of the playable media resource (the entry's first enclosure).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the value of the `title` field.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the `description`.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Publication date parsed from the source entry.
    pub fn published(&self) -> NaiveDateTime {
        self.published
    }

    /// When playback of this episode last started. `None` for unplayed.
    pub fn played(&self) -> Option<NaiveDateTime> {
        self.played
    }

    /// Stamp the episode as played right now and persist it.
    ///
    /// Called at the moment playback starts, not when it finishes.
    pub fn set_played_now(&mut self) -> Result<(), DataError> {
        self.played = Some(Utc::now().naive_utc());
        self.save().map(|_| ())
    }

    /// The unique live instance for the given episode id.
    pub fn get(id: i32) -> Result<Entity<Episode>, DataError> {
        cache::EPISODES.get_or_create(id, dbqueries::get_episode_from_id)
    }

    /// Every episode of every feed, ascending by publication date.
    pub fn get_all() -> Result<Vec<Entity<Episode>>, DataError> {
        dbqueries::get_episode_ids()?
            .into_iter()
            .map(Episode::get)
            .collect()
    }

    /// Episodes of one feed, ascending by publication date.
    pub fn get_by_feed(feed: &Feed) -> Result<Vec<Entity<Episode>>, DataError> {
        dbqueries::get_episode_ids_by_feed(feed.id())?
            .into_iter()
            .map(Episode::get)
            .collect()
    }

    /// Unplayed episodes of one feed, ascending by publication date.
    pub fn get_unplayed_by_feed(feed: &Feed) -> Result<Vec<Entity<Episode>>, DataError> {
        dbqueries::get_unplayed_episode_ids_by_feed(feed.id())?
            .into_iter()
            .map(Episode::get)
            .collect()
    }

    /// Lookup by the `(feed, guid)` natural key.
    pub fn get_by_guid(feed: &Feed, guid: &str) -> Result<Option<Entity<Episode>>, DataError> {
        dbqueries::get_episode_id_by_guid(feed.id(), guid)?
            .map(Episode::get)
            .transpose()
    }

    /// Stamp every unplayed episode of `feed` as played.
    ///
    /// Goes through the cached instances one by one so live handles stay in
    /// agreement with the rows.
    pub fn mark_all_played(feed: &Feed) -> Result<usize, DataError> {
        let episodes = Episode::get_unplayed_by_feed(feed)?;
        let count = episodes.len();
        for episode in &episodes {
            episode
                .write()
                .expect("episode lock poisoned")
                .set_played_now()?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    use crate::database::{test_lock, truncate_db};
    use crate::models::{NewEpisodeBuilder, NewFeedBuilder};

    fn date(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn seed_feed(url: &str) -> Result<i32> {
        Ok(dbqueries::insert_feed_for_test(
            NewFeedBuilder::default().url(url).build().unwrap(),
        )?)
    }

    fn seed_episode(feed_id: i32, guid: &str, published: &str) -> Result<i32> {
        let id = dbqueries::insert_episode_for_test(
            NewEpisodeBuilder::default()
                .feed_id(feed_id)
                .guid(guid)
                .url(format!("https://example.com/{guid}.mp3"))
                .title(format!("Episode {guid}"))
                .description(None)
                .published(date(published))
                .build()
                .unwrap(),
        )?;
        Ok(id.expect("fresh guid must insert"))
    }

    #[test]
    fn test_get_by_feed_ordering() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        let feed_id = seed_feed("https://example.com/order.xml")?;
        // Insert out of publication order on purpose.
        seed_episode(feed_id, "late", "2025-03-01 09:00:00")?;
        seed_episode(feed_id, "early", "2025-01-01 09:00:00")?;
        seed_episode(feed_id, "middle", "2025-02-01 09:00:00")?;

        let feed = dbqueries::get_feed_from_id(feed_id)?;
        let guids: Vec<String> = Episode::get_by_feed(&feed)?
            .iter()
            .map(|e| e.read().unwrap().guid().to_string())
            .collect();

        assert_eq!(guids, vec!["early", "middle", "late"]);

        // The cross-feed query re-sorts the same way.
        let all: Vec<String> = Episode::get_all()?
            .iter()
            .map(|e| e.read().unwrap().guid().to_string())
            .collect();
        assert_eq!(all, guids);
        Ok(())
    }

    #[test]
    fn test_set_played_now_persists() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        let feed_id = seed_feed("https://example.com/played.xml")?;
        let id = seed_episode(feed_id, "a", "2025-01-01 09:00:00")?;

        let episode = Episode::get(id)?;
        assert_eq!(episode.read().unwrap().played(), None);

        episode.write().unwrap().set_played_now()?;

        let row = dbqueries::get_episode_from_id(id)?;
        assert!(row.played().is_some());
        Ok(())
    }

    #[test]
    fn test_mark_all_played() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        let feed_id = seed_feed("https://example.com/markall.xml")?;
        seed_episode(feed_id, "a", "2025-01-01 09:00:00")?;
        seed_episode(feed_id, "b", "2025-01-02 09:00:00")?;

        let feed = dbqueries::get_feed_from_id(feed_id)?;
        assert_eq!(Episode::get_unplayed_by_feed(&feed)?.len(), 2);

        assert_eq!(Episode::mark_all_played(&feed)?, 2);
        assert_eq!(Episode::get_unplayed_by_feed(&feed)?.len(), 0);
        Ok(())
    }

    #[test]
    fn test_get_by_guid() -> Result<()> {
        let _guard = test_lock();
        truncate_db()?;

        let feed_id = seed_feed("https://example.com/guid.xml")?;
        let id = seed_episode(feed_id, "wanted", "2025-01-01 09:00:00")?;

        let feed = dbqueries::get_feed_from_id(feed_id)?;
        let found = Episode::get_by_guid(&feed, "wanted")?.expect("row exists");
        assert_eq!(found.read().unwrap().id(), id);
        assert!(Episode::get_by_guid(&feed, "missing")?.is_none());
        Ok(())
    }
}
