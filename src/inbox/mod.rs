//! The boundary towards whatever presents items to the user.
//!
//! New items are pushed into an [`ItemSink`] as each source completes; read
//! state changes come back through [`Inbox`].

use std::sync::Arc;

use chrono::Utc;

use crate::app::Result;
use crate::config::MarkAllScope;
use crate::domain::Item;
use crate::store::Store;

/// Receives new items, one batch per source, in completion order.
pub trait ItemSink {
    fn on_new_items(&mut self, source_url: &str, items: &[Item]);
}

/// Collects batches in memory.
impl ItemSink for Vec<(String, Vec<Item>)> {
    fn on_new_items(&mut self, source_url: &str, items: &[Item]) {
        self.push((source_url.to_string(), items.to_vec()));
    }
}

/// Read/unread request handlers over the state store.
pub struct Inbox<S: Store> {
    store: Arc<S>,
    scope: MarkAllScope,
    sources: Vec<String>,
}

impl<S: Store> Inbox<S> {
    pub fn new(store: Arc<S>, scope: MarkAllScope, sources: Vec<String>) -> Self {
        Self {
            store,
            scope,
            sources,
        }
    }

    /// Returns false if the item was unknown or already read.
    pub fn mark_read(&self, url: &str) -> Result<bool> {
        let updated = self.store.mark_read(url, Utc::now())?;
        tracing::debug!("Marked {} as read ({} rows)", url, updated);
        Ok(updated > 0)
    }

    pub fn mark_all_read(&self) -> Result<usize> {
        let sources = match self.scope {
            MarkAllScope::Global => None,
            MarkAllScope::Configured => Some(self.sources.as_slice()),
        };
        let updated = self.store.mark_all_unread_as_read(Utc::now(), sources)?;
        tracing::debug!("Marked {} items as read ({:?} scope)", updated, self.scope);
        Ok(updated)
    }

    pub fn recent_reads(&self, limit: usize, source_url: Option<&str>) -> Result<Vec<Item>> {
        self.store.recent_reads(limit, source_url)
    }

    pub fn unread(&self, source_url: Option<&str>) -> Result<Vec<Item>> {
        self.store.unread_items(source_url)
    }
}
