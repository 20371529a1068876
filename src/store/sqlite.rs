use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{FreshetError, Result};
use crate::domain::Item;
use crate::store::{StateOps, Store};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Flush and close the underlying connection.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().map_err(|e| poisoned(e.to_string()))?;
        conn.close().map_err(|(_, e)| FreshetError::Database(e))
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FreshetError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| poisoned(e.to_string()))
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    /// Fixed width, so ordering by the text column is chronological.
    fn format_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
        Ok(Item {
            source_url: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            read_timestamp: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| Self::parse_datetime(&s)),
        })
    }
}

fn poisoned(message: String) -> FreshetError {
    FreshetError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(1),
        Some(message),
    ))
}

impl StateOps for Connection {
    fn delete_stale(&self, source_url: &str, keep: &HashSet<String>) -> Result<usize> {
        let stored = {
            let mut stmt = self.prepare("SELECT item_url FROM state WHERE source_url = ?1")?;
            let urls = stmt
                .query_map(params![source_url], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            urls
        };

        let mut delete =
            self.prepare("DELETE FROM state WHERE source_url = ?1 AND item_url = ?2")?;
        let mut removed = 0;
        for url in stored.iter().filter(|url| !keep.contains(*url)) {
            removed += delete.execute(params![source_url, url])?;
        }

        Ok(removed)
    }

    fn already_read(&self, source_url: &str) -> Result<HashSet<String>> {
        let mut stmt = self.prepare(
            "SELECT item_url FROM state
             WHERE source_url = ?1 AND read_timestamp IS NOT NULL",
        )?;

        let urls = stmt
            .query_map(params![source_url], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;

        Ok(urls)
    }

    fn insert_if_absent(&self, source_url: &str, url: &str, title: &str) -> Result<bool> {
        // IGNORE keeps concurrent checks of the same source from duplicating rows.
        let inserted = self.execute(
            "INSERT OR IGNORE INTO state (source_url, item_url, title, read_timestamp)
             VALUES (?1, ?2, ?3, NULL)",
            params![source_url, url, title],
        )?;

        Ok(inserted > 0)
    }
}

impl StateOps for SqliteStore {
    fn delete_stale(&self, source_url: &str, keep: &HashSet<String>) -> Result<usize> {
        self.reconcile(|ops| ops.delete_stale(source_url, keep))
    }

    fn already_read(&self, source_url: &str) -> Result<HashSet<String>> {
        self.lock()?.already_read(source_url)
    }

    fn insert_if_absent(&self, source_url: &str, url: &str, title: &str) -> Result<bool> {
        self.lock()?.insert_if_absent(source_url, url, title)
    }
}

impl Store for SqliteStore {
    fn reconcile<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StateOps) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let result = f(&*tx)?;
        tx.commit()?;
        Ok(result)
    }

    fn mark_read(&self, url: &str, at: DateTime<Utc>) -> Result<usize> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE state SET read_timestamp = ?2
             WHERE item_url = ?1 AND read_timestamp IS NULL",
            params![url, Self::format_timestamp(at)],
        )?;

        Ok(updated)
    }

    fn mark_all_unread_as_read(
        &self,
        at: DateTime<Utc>,
        sources: Option<&[String]>,
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        let at = Self::format_timestamp(at);

        let Some(sources) = sources else {
            let updated = conn.execute(
                "UPDATE state SET read_timestamp = ?1 WHERE read_timestamp IS NULL",
                params![at],
            )?;
            return Ok(updated);
        };

        let tx = conn.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE state SET read_timestamp = ?1
                 WHERE source_url = ?2 AND read_timestamp IS NULL",
            )?;
            for source_url in sources {
                updated += stmt.execute(params![at, source_url])?;
            }
        }
        tx.commit()?;

        Ok(updated)
    }

    fn recent_reads(&self, limit: usize, source_url: Option<&str>) -> Result<Vec<Item>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT source_url, item_url, title, read_timestamp FROM state
             WHERE read_timestamp IS NOT NULL AND (?1 IS NULL OR source_url = ?1)
             ORDER BY read_timestamp DESC, item_url
             LIMIT ?2",
        )?;

        let items = stmt
            .query_map(params![source_url, limit as i64], Self::item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn unread_items(&self, source_url: Option<&str>) -> Result<Vec<Item>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT source_url, item_url, title, read_timestamp FROM state
             WHERE read_timestamp IS NULL AND (?1 IS NULL OR source_url = ?1)
             ORDER BY source_url, rowid",
        )?;

        let items = stmt
            .query_map(params![source_url], Self::item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn unread_count(&self, source_url: &str) -> Result<i64> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM state WHERE source_url = ?1 AND read_timestamp IS NULL",
            params![source_url],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    fn items_for_source(&self, source_url: &str) -> Result<Vec<Item>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT source_url, item_url, title, read_timestamp FROM state
             WHERE source_url = ?1 ORDER BY rowid",
        )?;

        let items = stmt
            .query_map(params![source_url], Self::item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn remove_sources_not_in(&self, active: &[String]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stale: Vec<String> = {
            let mut stmt = tx.prepare("SELECT DISTINCT source_url FROM state")?;
            let stored = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            stored
                .into_iter()
                .filter(|url| !active.contains(url))
                .collect()
        };

        if stale.is_empty() {
            return Ok(0);
        }

        tracing::info!(
            "Deleting {} unsubscribed sources from state: {:?}",
            stale.len(),
            stale
        );

        let mut removed = 0;
        for source_url in &stale {
            removed += tx.execute("DELETE FROM state WHERE source_url = ?1", params![source_url])?;
        }
        tx.commit()?;

        Ok(removed)
    }

    fn import_read(&self, source_url: &str, url: &str, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO state (source_url, item_url, title, read_timestamp)
             VALUES (?1, ?2, '', ?3)",
            params![source_url, url, Self::format_timestamp(at)],
        )?;

        Ok(inserted > 0)
    }
}
