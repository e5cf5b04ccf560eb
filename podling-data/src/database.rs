// database.rs
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

//! Database Setup. This is only public to help with some unit tests.

use diesel::prelude::*;
use diesel::r2d2;
use diesel::r2d2::ConnectionManager;

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use std::sync::LazyLock;

#[cfg(not(test))]
use std::path::PathBuf;

#[cfg(test)]
use std::sync::{Mutex, MutexGuard};

use crate::errors::DataError;

type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

// The `PODLING_DB_PATH` override exists for the sake of out-of-crate test
// suites; everything else goes through the XDG data dir.
#[cfg(not(test))]
static POOL: LazyLock<Pool> = LazyLock::new(|| {
    let pathbuf = match std::env::var("PODLING_DB_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => crate::xdg_dirs::PODLING_XDG
            .place_data_file("podling.db")
            .unwrap(),
    };
    let db_path = pathbuf.to_str().unwrap();
    init_pool(db_path)
});

// With cargo test the pool is shared between every #[test], so each db test
// starts with truncate_db() and holds the lock from test_lock() for its whole
// body to keep parallel tests from stepping on each other's rows.
#[cfg(test)]
static POOL: LazyLock<Mutex<Pool>> = LazyLock::new(|| {
    let db = tempfile::Builder::new()
        .suffix("-podling.db")
        .tempfile()
        .unwrap();
    // Persist the temp file for the lifetime of the test process. Otherwise the
    // NamedTempFile is dropped at the end of this initializer, unlinking the db
    // file right after migrations run, and every later write fails with
    // "attempt to write a readonly database".
    let (_file, path) = db.keep().unwrap();
    let db_path = path.to_str().unwrap();
    Mutex::new(init_pool(db_path))
});

/// Get an r2d2 `SqliteConnection` pool.
#[cfg(not(test))]
pub(crate) fn connection() -> Pool {
    POOL.clone()
}

#[cfg(test)]
pub(crate) fn connection() -> Pool {
    POOL.lock().unwrap().clone()
}

fn init_pool(db_path: &str) -> Pool {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool.");

    {
        let mut db = pool.get().expect("Failed to initialize pool.");
        run_migration_on(&mut db).expect("Failed to run migrations during init.");
    }
    info!("Database pool initialized.");
    pool
}

fn run_migration_on(
    conn: &mut SqliteConnection,
) -> Result<Vec<diesel::migration::MigrationVersion<'_>>, DataError> {
    info!("Running DB Migrations...");
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| DataError::DieselMigrationError(err.to_string()))
}

/// Wipe every row and drop the cached instances that pointed to them.
///
/// Public so out-of-crate test suites can reset state between cases; sqlite
/// reuses row ids after a delete, so the identity cache has to go with them.
pub fn truncate_db() -> Result<(), DataError> {
    let db = connection();
    let mut con = db.get()?;

    con.transaction::<(), diesel::result::Error, _>(|con| {
        diesel::delete(crate::schema::episodes::table).execute(con)?;
        diesel::delete(crate::schema::feeds::table).execute(con)?;
        Ok(())
    })?;

    crate::cache::FEEDS.clear();
    crate::cache::EPISODES.clear();
    Ok(())
}

/// Serialize db tests. Every test touching the shared pool takes this first.
#[cfg(test)]
pub(crate) fn test_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    // A previous test may have panicked while holding it; the data is ().
    LOCK.lock().unwrap_or_else(|err| err.into_inner())
}
