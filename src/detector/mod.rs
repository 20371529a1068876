//! Reconciles a source's freshly extracted links against stored state.
//!
//! After a cycle the stored URLs of a source equal the URLs extracted in that
//! cycle: vanished items are deleted, unseen ones inserted unread, and
//! surviving ones keep their read state. Only rows inserted by this cycle are
//! reported, so every item is reported at most once while it stays listed.
//! An item that vanishes and later returns is new again.

use std::collections::HashSet;

use crate::app::Result;
use crate::domain::{Extraction, Item};
use crate::store::Store;

/// Outcome of reconciling one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Newly seen items in document order; may be empty.
    Fresh(Vec<Item>),
    /// The selectors matched nothing. The store was not touched.
    NoMatch,
    /// Link and title counts differ. The store was not touched.
    Malformed { links: usize, titles: usize },
}

pub struct ChangeDetector<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> ChangeDetector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `extraction` must already hold absolute links.
    pub fn detect(&self, source_url: &str, extraction: &Extraction) -> Result<Detection> {
        if extraction.is_empty() {
            return Ok(Detection::NoMatch);
        }

        let Extraction { links, titles } = extraction;
        if links.len() != titles.len() {
            return Ok(Detection::Malformed {
                links: links.len(),
                titles: titles.len(),
            });
        }

        let current: HashSet<String> = links.iter().cloned().collect();

        let fresh = self.store.reconcile(|ops| {
            let removed = ops.delete_stale(source_url, &current)?;
            if removed > 0 {
                tracing::debug!("Removed {} vanished items from {}", removed, source_url);
            }

            let already_read = ops.already_read(source_url)?;

            let mut fresh = Vec::new();
            for (url, title) in links.iter().zip(titles) {
                if already_read.contains(url) {
                    continue;
                }
                let title = title.trim();
                if ops.insert_if_absent(source_url, url, title)? {
                    fresh.push(Item::new(source_url, url, title));
                }
            }
            Ok(fresh)
        })?;

        if fresh.is_empty() {
            tracing::debug!("No new items on {}", source_url);
        } else {
            tracing::debug!("Found {} new items on {}", fresh.len(), source_url);
        }

        Ok(Detection::Fresh(fresh))
    }
}
