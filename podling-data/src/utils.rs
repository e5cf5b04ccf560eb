// utils.rs
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

//! Helper utilities for accomplishing various tasks.

use url::{Position, Url};

/// Strip fragment identifiers from a URL.
pub fn url_cleaner(s: &str) -> String {
    // Adapted from the cookbook.
    // https://rust-lang-nursery.github.io/rust-cookbook/net.html
    // #remove-fragment-identifiers-and-query-pairs-from-a-url
    match Url::parse(s) {
        Ok(parsed) => parsed[..Position::AfterQuery].to_owned(),
        _ => s.trim().to_owned(),
    }
}

/// Strip scripts and event handlers from remote html snippets, and the `rel`
/// attributes from `<a>` tags.
pub(crate) fn sanitize_html(text: &str) -> String {
    ammonia::Builder::new()
        .link_rel(None)
        .clean(text.trim())
        .to_string()
}

/// Sanitized description, `None` when the remote sent an empty one.
pub(crate) fn non_empty_description(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(sanitize_html)
}
