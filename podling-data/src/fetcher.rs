// fetcher.rs
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

//! Conditional-GET access to remote feed documents.
//!
//! The syncer only speaks [`Fetch`]; redirects, TLS and connection reuse are
//! the http client's business.

use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::{HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::redirect::Policy;
use reqwest::StatusCode;

use crate::errors::SyncError;
use crate::USER_AGENT;

/// Stored validators presented to the remote on a conditional fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validators<'a> {
    /// The `ETag` of the representation we already hold.
    pub etag: Option<&'a str>,
    /// The `Last-Modified` date of the representation we already hold.
    pub modified: Option<&'a str>,
}

/// A successfully fetched feed document and its response validators.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    /// Raw document bytes. The feed parser does its own encoding detection.
    pub body: Vec<u8>,
    /// `ETag` response header, if any.
    pub etag: Option<String>,
    /// `Last-Modified` response header, if any.
    pub modified: Option<String>,
}

/// Outcome of fetching a feed's remote representation.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// HTTP 304. The representation we hold is still current.
    NotModified,
    /// A fresh representation.
    Fetched(FetchedDocument),
}

/// The HTTP fetch collaborator consumed by the syncer.
pub trait Fetch {
    /// Fetch `url`, presenting `validators` for revalidation.
    fn fetch(&self, url: &str, validators: Validators<'_>) -> Result<FetchOutcome, SyncError>;
}

/// [`Fetch`] implementation backed by a blocking `reqwest` client.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Construct a fetcher with the shared client settings.
    pub fn new() -> Result<HttpFetcher, reqwest::Error> {
        client_builder().build().map(|client| HttpFetcher { client })
    }
}

pub(crate) fn client_builder() -> ClientBuilder {
    // Haven't included the loop check as some hosts loop back
    // once before giving the correct url.
    let policy = Policy::custom(|attempt| {
        info!("Redirect Attempt URL: {:?}", attempt.url());
        if attempt.previous().len() > 20 {
            attempt.error("too many redirects")
        } else if Some(attempt.url()) == attempt.previous().last() {
            // avoid redirect loops
            attempt.stop()
        } else {
            attempt.follow()
        }
    });

    Client::builder()
        .redirect(policy)
        .referer(false)
        .user_agent(USER_AGENT)
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, validators: Validators<'_>) -> Result<FetchOutcome, SyncError> {
        let mut request = self.client.get(url);

        if let Some(etag) = validators.etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        if let Some(modified) = validators.modified {
            request = request.header(IF_MODIFIED_SINCE, modified);
        }

        let response = request.send().map_err(|source| SyncError::Fetch {
            url: url.to_owned(),
            source,
        })?;

        match response.status() {
            StatusCode::NOT_MODIFIED => {
                info!("{} is up to date", url);
                Ok(FetchOutcome::NotModified)
            }
            status if status.is_success() => {
                let etag = header_string(&response, ETAG);
                let modified = header_string(&response, LAST_MODIFIED);
                let body = response
                    .bytes()
                    .map_err(|source| SyncError::Fetch {
                        url: url.to_owned(),
                        source,
                    })?
                    .to_vec();

                Ok(FetchOutcome::Fetched(FetchedDocument {
                    body,
                    etag,
                    modified,
                }))
            }
            status => Err(SyncError::HttpStatus {
                url: url.to_owned(),
                status,
            }),
        }
    }
}

fn header_string(response: &Response, header: HeaderName) -> Option<String> {
    response
        .headers()
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
