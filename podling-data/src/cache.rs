// cache.rs
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

//! Process-wide identity cache for database rows.
//!
//! Every persisted `Feed`/`Episode` row is represented by at most one live
//! object. All lookups go through [`Registry::get_or_create`], which hands out
//! clones of the same [`Entity`] handle, so a mutation made through one handle
//! is visible to every other holder.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, RwLock};

use crate::errors::DataError;
use crate::models::{Episode, Feed};

/// Shared handle to the unique live instance of a row.
pub type Entity<T> = Arc<RwLock<T>>;

/// An id -> instance table for a single model type.
///
/// Entries are never evicted. Feed and episode counts are small and the cache
/// lives as long as the process does.
#[derive(Debug)]
pub struct Registry<T> {
    inner: Mutex<HashMap<i32, Entity<T>>>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Registry {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Return the unique live instance for `id`.
    ///
    /// If none is registered yet, `loader(id)` constructs one. The map lock is
    /// held across construct-and-register, so two concurrent first lookups for
    /// the same `id` can not end up with two distinct instances.
    pub fn get_or_create<F>(&self, id: i32, loader: F) -> Result<Entity<T>, DataError>
    where
        F: FnOnce(i32) -> Result<T, DataError>,
    {
        let mut map = self.inner.lock().expect("registry lock poisoned");

        if let Some(entity) = map.get(&id) {
            return Ok(Arc::clone(entity));
        }

        let entity = Arc::new(RwLock::new(loader(id)?));
        map.insert(id, Arc::clone(&entity));
        Ok(entity)
    }

    /// Lookup without constructing.
    pub fn get(&self, id: i32) -> Option<Entity<T>> {
        let map = self.inner.lock().expect("registry lock poisoned");
        map.get(&id).map(Arc::clone)
    }

    /// Drop every registered instance.
    ///
    /// Only sane together with a database reset; sqlite reuses row ids.
    pub(crate) fn clear(&self) {
        let mut map = self.inner.lock().expect("registry lock poisoned");
        map.clear();
    }
}

/// The `Feed` instance table.
pub static FEEDS: LazyLock<Registry<Feed>> = LazyLock::new(Registry::new);

/// The `Episode` instance table.
pub static EPISODES: LazyLock<Registry<Episode>> = LazyLock::new(Registry::new);

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Dummy {
        id: i32,
        label: String,
    }

    #[test]
    fn test_same_id_same_instance() -> Result<(), DataError> {
        let registry: Registry<Dummy> = Registry::new();

        let first = registry.get_or_create(7, |id| {
            Ok(Dummy {
                id,
                label: "first".into(),
            })
        })?;
        let second = registry.get_or_create(7, |_| unreachable!("loader must not rerun"))?;

        assert!(Arc::ptr_eq(&first, &second));
        Ok(())
    }

    #[test]
    fn test_mutation_is_visible_through_every_handle() -> Result<(), DataError> {
        let registry: Registry<Dummy> = Registry::new();

        let first = registry.get_or_create(1, |id| {
            Ok(Dummy {
                id,
                label: "stale".into(),
            })
        })?;
        let second = registry.get_or_create(1, |_| unreachable!())?;

        first.write().unwrap().label = "fresh".into();
        assert_eq!(second.read().unwrap().label, "fresh");
        Ok(())
    }

    #[test]
    fn test_loader_runs_once_per_id() -> Result<(), DataError> {
        let registry: Registry<Dummy> = Registry::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            registry.get_or_create(3, |id| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Dummy {
                    id,
                    label: String::new(),
                })
            })?;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_loader_failure_registers_nothing() {
        let registry: Registry<Dummy> = Registry::new();

        let res = registry.get_or_create(9, |_| {
            Err(DataError::DieselResultError(
                diesel::result::Error::NotFound,
            ))
        });

        assert!(res.is_err());
        assert!(registry.get(9).is_none());
    }
}
