// errors.rs
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

use thiserror::Error;

use std::io;

/// Errors of the storage layer.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("SQL Query failed: {0}")]
    DieselResultError(#[from] diesel::result::Error),
    #[error("Database Migration error: {0}")]
    DieselMigrationError(String),
    #[error("R2D2 error: {0}")]
    R2D2Error(#[from] diesel::r2d2::Error),
    #[error("R2D2 Pool error: {0}")]
    R2D2PoolError(#[from] diesel::r2d2::PoolError),
    #[error("IO Error: {0}")]
    IOError(#[from] io::Error),
}

/// Hard failures of `syncer::add` and `syncer::sync`.
///
/// These bubble up to the caller untouched; the view layer is expected to
/// present them. A failed sync leaves the feed's persisted state unchanged.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The url already belongs to a tracked feed.
    #[error("A feed with the url {0} already exists")]
    DuplicateFeed(String),
    /// The given string is not a url at all.
    #[error("Failed to parse a url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Transport-level failure while fetching the document.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote answered with a status we can't do anything with.
    #[error("Request to {url} returned {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    /// The fetched document is not a syndication feed.
    #[error("Failed to parse the feed document: {0}")]
    Parse(#[from] rss::Error),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Soft, per-entry failures during ingestion.
///
/// An entry that raises one of these is skipped and logged; the rest of the
/// batch is ingested normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("Entry carries no guid.")]
    MissingGuid,
    #[error("Entry carries no title.")]
    MissingTitle,
    #[error("Entry carries no enclosure.")]
    MissingEnclosure,
    #[error("Entry carries no publication date.")]
    MissingPubDate,
    #[error("Entry publication date is garbage: {0}")]
    InvalidPubDate(String),
}
