// backend.rs
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

/// Contract of the media-decoding backend.
///
/// The backend holds at most one active media session: a `load` replaces
/// whatever was loaded before.
pub trait PlaybackBackend {
    /// Load the media resource at `uri` into the backend.
    fn load(&mut self, uri: &str);

    /// Start playback of the loaded resource.
    fn play(&mut self);

    /// Stop playback and release the media session.
    fn stop(&mut self);

    /// Register a one-shot handler for the end-of-media notification.
    ///
    /// The handler is invoked at most once per registration, and the
    /// notification delivery is NOT reentrant-safe: the handler must not
    /// invoke any playback-control call itself, only hand the event off to
    /// the host event loop.
    fn on_end_reached(&mut self, handler: Box<dyn FnOnce() + Send>);
}
