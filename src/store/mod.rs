pub mod sqlite;

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::Item;

pub use sqlite::SqliteStore;

/// Per-source reconciliation primitives.
///
/// Implemented by the store itself (each call commits on its own) and by the
/// transaction handle passed to [`Store::reconcile`].
pub trait StateOps {
    /// Remove every item of `source_url` whose URL is not in `keep`.
    fn delete_stale(&self, source_url: &str, keep: &HashSet<String>) -> Result<usize>;
    /// URLs of `source_url` that carry a read timestamp.
    fn already_read(&self, source_url: &str) -> Result<HashSet<String>>;
    /// Insert an unread item; returns false if `(source_url, url)` already exists.
    fn insert_if_absent(&self, source_url: &str, url: &str, title: &str) -> Result<bool>;
}

pub trait Store: StateOps {
    /// Run `f` inside one transaction; nothing is applied if it fails.
    fn reconcile<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StateOps) -> Result<T>;

    // Read state
    fn mark_read(&self, url: &str, at: DateTime<Utc>) -> Result<usize>;
    /// Mark every unread item read, optionally only for the given sources.
    fn mark_all_unread_as_read(&self, at: DateTime<Utc>, sources: Option<&[String]>)
        -> Result<usize>;
    fn recent_reads(&self, limit: usize, source_url: Option<&str>) -> Result<Vec<Item>>;
    fn unread_items(&self, source_url: Option<&str>) -> Result<Vec<Item>>;
    fn unread_count(&self, source_url: &str) -> Result<i64>;

    // Maintenance
    fn items_for_source(&self, source_url: &str) -> Result<Vec<Item>>;
    fn remove_sources_not_in(&self, active: &[String]) -> Result<usize>;
    /// Insert an item already marked read; no-op if it exists.
    fn import_read(&self, source_url: &str, url: &str, at: DateTime<Utc>) -> Result<bool>;
}
