// sequencer.rs
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

//! Ordered, uninterrupted consumption of an episode queue.
//!
//! The backend's end-of-media notification is not reentrant-safe, so the
//! registered handler never drives playback itself. It posts a
//! [`PlayerAction`] on a channel owned by the host event loop, and the loop
//! calls [`Sequencer::proceed`] to start the next item. Tokens tie each
//! continuation to the sequence that registered it; a stopped or superseded
//! sequence leaves only stale tokens behind, which `proceed` drops.

use std::collections::VecDeque;
use std::fmt;

use crossbeam_channel::Sender;

use podling_data::errors::DataError;
use podling_data::{Entity, Episode};

use crate::backend::PlaybackBackend;

/// Messages the sequencer posts for the host event loop to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// The playing item reached its end; hand the token back to
    /// [`Sequencer::proceed`].
    Continue(u64),
}

/// Plays a contiguous ordered list of episodes, one at a time, marking each
/// as played at the moment it starts.
///
/// Construct one and hand it to the view layer; at most one sequence is
/// active at a time and starting a new one supersedes the old.
pub struct Sequencer<B: PlaybackBackend> {
    backend: B,
    sender: Sender<PlayerAction>,
    queue: VecDeque<Entity<Episode>>,
    generation: u64,
}

impl<B: PlaybackBackend> fmt::Debug for Sequencer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("queue", &self.queue.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<B: PlaybackBackend> Sequencer<B> {
    /// Construct a sequencer posting its actions on `sender`.
    pub fn new(backend: B, sender: Sender<PlayerAction>) -> Sequencer<B> {
        Sequencer {
            backend,
            sender,
            queue: VecDeque::new(),
            generation: 0,
        }
    }

    /// Play a single episode immediately. No queue semantics; nothing is
    /// scheduled for when it ends.
    pub fn play_one(&mut self, episode: &Entity<Episode>) -> Result<(), DataError> {
        self.generation = self.generation.wrapping_add(1);
        self.queue.clear();
        self.start(episode)
    }

    /// Drain `episodes` in order, one at a time, advancing on end-of-media.
    ///
    /// An empty sequence is a no-op. A previously playing sequence is
    /// superseded; its pending continuation will be dropped.
    pub fn play_list(&mut self, episodes: Vec<Entity<Episode>>) -> Result<(), DataError> {
        self.generation = self.generation.wrapping_add(1);
        self.queue = episodes.into();
        self.advance()
    }

    /// Continue with the next queued episode.
    ///
    /// Called by the host loop when it picks up a [`PlayerAction::Continue`].
    /// A token minted before the current sequence means the continuation is
    /// stale and gets dropped.
    pub fn proceed(&mut self, token: u64) -> Result<(), DataError> {
        if token != self.generation {
            debug!("Dropping stale continuation (token {}).", token);
            return Ok(());
        }
        self.advance()
    }

    /// Stop playback and abandon the rest of the queue.
    ///
    /// An in-flight end-of-media event of the stopped sequence will not
    /// trigger a continuation.
    pub fn stop(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.queue.clear();
        self.backend.stop();
    }

    fn advance(&mut self) -> Result<(), DataError> {
        let Some(episode) = self.queue.pop_front() else {
            debug!("Queue drained, going idle.");
            return Ok(());
        };

        self.start(&episode)?;

        // The notification callback must not touch the backend; it only
        // posts the continuation for the host loop to dispatch.
        let sender = self.sender.clone();
        let token = self.generation;
        self.backend.on_end_reached(Box::new(move || {
            let _ = sender.send(PlayerAction::Continue(token));
        }));

        Ok(())
    }

    fn start(&mut self, episode: &Entity<Episode>) -> Result<(), DataError> {
        let uri = {
            let mut episode = episode.write().expect("episode lock poisoned");
            // An episode counts as played the moment it starts.
            episode.set_played_now()?;
            info!("Playing {}", episode.title());
            episode.url().to_owned()
        };

        self.backend.load(&uri);
        self.backend.play();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;
    use crossbeam_channel::{unbounded, Receiver};

    use podling_data::database::truncate_db;
    use podling_data::errors::SyncError;
    use podling_data::syncer;
    use podling_data::{Fetch, FetchOutcome, FetchedDocument, Validators};

    use std::env;
    use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

    const QUEUE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Queue Feed</title>
    <link>https://queue.example.com</link>
    <description>Three episodes to drain.</description>
    <item>
      <title>First</title>
      <guid isPermaLink="false">a</guid>
      <pubDate>Mon, 03 Feb 2025 06:00:00 +0000</pubDate>
      <enclosure url="https://cdn.example.com/queue/a.mp3" length="1000" type="audio/mpeg"/>
    </item>
    <item>
      <title>Second</title>
      <guid isPermaLink="false">b</guid>
      <pubDate>Tue, 04 Feb 2025 06:00:00 +0000</pubDate>
      <enclosure url="https://cdn.example.com/queue/b.mp3" length="1000" type="audio/mpeg"/>
    </item>
    <item>
      <title>Third</title>
      <guid isPermaLink="false">c</guid>
      <pubDate>Wed, 05 Feb 2025 06:00:00 +0000</pubDate>
      <enclosure url="https://cdn.example.com/queue/c.mp3" length="1000" type="audio/mpeg"/>
    </item>
  </channel>
</rss>
"#;

    struct MockFetcher;

    impl Fetch for MockFetcher {
        fn fetch(
            &self,
            _url: &str,
            _validators: Validators<'_>,
        ) -> Result<FetchOutcome, SyncError> {
            Ok(FetchOutcome::Fetched(FetchedDocument {
                body: QUEUE_FEED.as_bytes().to_vec(),
                etag: None,
                modified: None,
            }))
        }
    }

    #[derive(Default)]
    struct BackendState {
        loads: Vec<String>,
        playing: bool,
        overlapped: bool,
        handler: Option<Box<dyn FnOnce() + Send>>,
    }

    /// Scripted backend; the test fires end-of-media by hand.
    #[derive(Clone, Default)]
    struct MockBackend {
        state: Arc<Mutex<BackendState>>,
    }

    impl MockBackend {
        /// Deliver the end-of-media notification for the current item.
        fn finish_current(&self) {
            let handler = {
                let mut state = self.state.lock().unwrap();
                state.playing = false;
                state.handler.take()
            };
            if let Some(handler) = handler {
                handler();
            }
        }

        /// Pull the registered handler out without running it, as if the
        /// event were still in flight.
        fn steal_handler(&self) -> Option<Box<dyn FnOnce() + Send>> {
            self.state.lock().unwrap().handler.take()
        }

        fn loads(&self) -> Vec<String> {
            self.state.lock().unwrap().loads.clone()
        }

        fn has_handler(&self) -> bool {
            self.state.lock().unwrap().handler.is_some()
        }

        fn overlapped(&self) -> bool {
            self.state.lock().unwrap().overlapped
        }
    }

    impl PlaybackBackend for MockBackend {
        fn load(&mut self, uri: &str) {
            let mut state = self.state.lock().unwrap();
            if state.playing {
                state.overlapped = true;
            }
            state.loads.push(uri.to_owned());
        }

        fn play(&mut self) {
            self.state.lock().unwrap().playing = true;
        }

        fn stop(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.playing = false;
            state.handler = None;
        }

        fn on_end_reached(&mut self, handler: Box<dyn FnOnce() + Send>) {
            self.state.lock().unwrap().handler = Some(handler);
        }
    }

    // The data crate points its pool at PODLING_DB_PATH; park it on a temp
    // file before anything opens a connection, and serialize the tests.
    fn init_db() -> MutexGuard<'static, ()> {
        static DB: LazyLock<tempfile::NamedTempFile> = LazyLock::new(|| {
            let db = tempfile::Builder::new()
                .suffix("-podling.db")
                .tempfile()
                .unwrap();
            env::set_var("PODLING_DB_PATH", db.path());
            db
        });
        static LOCK: Mutex<()> = Mutex::new(());

        let guard = LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let _ = &*DB;
        truncate_db().unwrap();
        guard
    }

    fn queue_episodes() -> Result<Vec<Entity<Episode>>> {
        let feed = syncer::add(&MockFetcher, "https://queue.example.com/feed.xml")?;
        let feed = feed.read().unwrap();
        Ok(Episode::get_by_feed(&feed)?)
    }

    fn pump(sequencer: &mut Sequencer<MockBackend>, receiver: &Receiver<PlayerAction>) {
        while let Ok(PlayerAction::Continue(token)) = receiver.try_recv() {
            sequencer.proceed(token).unwrap();
        }
    }

    fn played(episode: &Entity<Episode>) -> bool {
        episode.read().unwrap().played().is_some()
    }

    #[test]
    fn test_play_list_drains_in_order() -> Result<()> {
        let _guard = init_db();

        let episodes = queue_episodes()?;
        assert_eq!(episodes.len(), 3);

        let backend = MockBackend::default();
        let (sender, receiver) = unbounded();
        let mut sequencer = Sequencer::new(backend.clone(), sender);

        sequencer.play_list(episodes.clone())?;

        // Only the head started; it was stamped played at start time.
        assert_eq!(backend.loads(), vec!["https://cdn.example.com/queue/a.mp3"]);
        assert!(played(&episodes[0]));
        assert!(!played(&episodes[1]));
        assert!(!played(&episodes[2]));

        backend.finish_current();
        pump(&mut sequencer, &receiver);
        assert!(played(&episodes[1]));
        assert!(!played(&episodes[2]));

        backend.finish_current();
        pump(&mut sequencer, &receiver);
        assert!(played(&episodes[2]));

        // Last item ends; the sequence goes idle without another load.
        backend.finish_current();
        pump(&mut sequencer, &receiver);

        assert_eq!(
            backend.loads(),
            vec![
                "https://cdn.example.com/queue/a.mp3",
                "https://cdn.example.com/queue/b.mp3",
                "https://cdn.example.com/queue/c.mp3",
            ]
        );
        assert!(!backend.overlapped());

        // Start stamps are monotone over the drain order.
        let stamps: Vec<_> = episodes
            .iter()
            .map(|e| e.read().unwrap().played().unwrap())
            .collect();
        assert!(stamps[0] <= stamps[1] && stamps[1] <= stamps[2]);
        Ok(())
    }

    #[test]
    fn test_empty_playlist_is_a_noop() -> Result<()> {
        let _guard = init_db();

        let backend = MockBackend::default();
        let (sender, receiver) = unbounded();
        let mut sequencer = Sequencer::new(backend.clone(), sender);

        sequencer.play_list(Vec::new())?;

        assert!(backend.loads().is_empty());
        assert!(!backend.has_handler());
        assert!(receiver.try_recv().is_err());
        Ok(())
    }

    #[test]
    fn test_play_one_registers_no_continuation() -> Result<()> {
        let _guard = init_db();

        let episodes = queue_episodes()?;
        let backend = MockBackend::default();
        let (sender, receiver) = unbounded();
        let mut sequencer = Sequencer::new(backend.clone(), sender);

        sequencer.play_one(&episodes[1])?;

        assert_eq!(backend.loads(), vec!["https://cdn.example.com/queue/b.mp3"]);
        assert!(played(&episodes[1]));
        assert!(!backend.has_handler());

        backend.finish_current();
        assert!(receiver.try_recv().is_err());
        Ok(())
    }

    #[test]
    fn test_stop_cancels_inflight_continuation() -> Result<()> {
        let _guard = init_db();

        let episodes = queue_episodes()?;
        let backend = MockBackend::default();
        let (sender, receiver) = unbounded();
        let mut sequencer = Sequencer::new(backend.clone(), sender);

        sequencer.play_list(episodes.clone())?;

        // The end event is already in flight when the user hits stop.
        let inflight = backend.steal_handler().expect("continuation registered");
        sequencer.stop();
        inflight();

        pump(&mut sequencer, &receiver);

        // The stale continuation was dropped; nothing else started.
        assert_eq!(backend.loads().len(), 1);
        assert!(!played(&episodes[1]));
        Ok(())
    }

    #[test]
    fn test_new_playlist_supersedes_old_continuation() -> Result<()> {
        let _guard = init_db();

        let episodes = queue_episodes()?;
        let backend = MockBackend::default();
        let (sender, receiver) = unbounded();
        let mut sequencer = Sequencer::new(backend.clone(), sender);

        sequencer.play_list(vec![episodes[0].clone(), episodes[1].clone()])?;
        let stale = backend.steal_handler().expect("continuation registered");

        sequencer.play_list(vec![episodes[2].clone()])?;
        stale();
        pump(&mut sequencer, &receiver);

        assert_eq!(
            backend.loads(),
            vec![
                "https://cdn.example.com/queue/a.mp3",
                "https://cdn.example.com/queue/c.mp3",
            ]
        );
        // The superseded queue never reached its second item.
        assert!(!played(&episodes[1]));
        Ok(())
    }
}
