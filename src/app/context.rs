use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;

use crate::app::error::{FreshetError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::inbox::{Inbox, ItemSink};
use crate::store::{SqliteStore, Store};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub parallel_fetcher: ParallelFetcher,
}

/// Totals of one `check_all` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub sources: usize,
    pub sources_with_items: usize,
    pub new_items: usize,
}

impl AppContext {
    /// Open the state store and HTTP clients for `config`.
    ///
    /// `workers` overrides `fetch.max_concurrency`.
    pub fn new(config: Config, workers: Option<usize>) -> Result<Self> {
        let db_path = match &config.state.db_path {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                p.clone()
            }
            None => Self::default_db_path()?,
        };

        let store = SqliteStore::new(&db_path)?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);

        Self::with_parts(config, store, fetcher, workers)
    }

    /// Assemble a context from an already opened store and fetcher.
    ///
    /// Items of sources that are no longer configured are deleted here.
    pub fn with_parts(
        config: Config,
        store: SqliteStore,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        workers: Option<usize>,
    ) -> Result<Self> {
        let parallel_fetcher = match workers.or(config.fetch.max_concurrency) {
            Some(workers) => ParallelFetcher::with_workers(fetcher, workers),
            None => ParallelFetcher::new(fetcher),
        };

        let removed = store.remove_sources_not_in(&config.source_urls())?;
        if removed > 0 {
            tracing::info!("Removed {} items of unsubscribed sources", removed);
        }

        Ok(Self {
            config,
            store: Arc::new(store),
            parallel_fetcher,
        })
    }

    pub fn inbox(&self) -> Inbox<SqliteStore> {
        Inbox::new(
            self.store.clone(),
            self.config.state.mark_all_scope,
            self.config.source_urls(),
        )
    }

    /// Check every configured source, handing batches to `sink` as they finish.
    pub async fn check_all<K: ItemSink>(&self, sink: &mut K) -> CheckSummary {
        let sources = self.config.sources.clone();
        let mut summary = CheckSummary {
            sources: sources.len(),
            ..CheckSummary::default()
        };

        let mut batches = self.parallel_fetcher.run_all(sources, self.store.clone());
        while let Some(batch) = batches.next().await {
            if !batch.items.is_empty() {
                summary.sources_with_items += 1;
                summary.new_items += batch.items.len();
            }
            sink.on_new_items(&batch.source_url, &batch.items);
        }

        tracing::debug!("Check finished: {:?}", summary);
        summary
    }

    /// Release the HTTP clients and close the state store.
    pub fn shutdown(self) -> Result<()> {
        drop(self.parallel_fetcher);
        match Arc::try_unwrap(self.store) {
            Ok(store) => store.close(),
            Err(_) => {
                tracing::warn!("State store still shared at shutdown, leaving it to drop");
                Ok(())
            }
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FreshetError::Other("Could not find data directory".into()))?;
        let freshet_dir = data_dir.join("freshet");
        std::fs::create_dir_all(&freshet_dir)?;
        Ok(freshet_dir.join("state.sqlite3"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FetchOptions, Item, Source};
    use crate::selector::{SelectorDef, XPathSelector};
    use crate::store::StateOps;
    use async_trait::async_trait;

    const PAGE: &[u8] = br#"<ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul>"#;

    struct StaticFetcher;

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<Vec<u8>> {
            match url {
                "https://ex.test/" => Ok(PAGE.to_vec()),
                _ => Err(FreshetError::Connection {
                    url: url.to_string(),
                    message: "refused".into(),
                }),
            }
        }
    }

    fn config() -> Config {
        let selector = SelectorDef::Xpath(XPathSelector::new("//a/@href", "//a/text()"));
        Config {
            sources: vec![
                Source::new("https://ex.test/", vec![selector.clone()]),
                Source::new("https://down.test/", vec![selector]),
            ],
            ..Config::default()
        }
    }

    fn context(store: SqliteStore) -> AppContext {
        AppContext::with_parts(config(), store, Arc::new(StaticFetcher), None).unwrap()
    }

    #[test]
    fn test_unsubscribed_sources_pruned_on_startup() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_if_absent("https://gone.test/", "https://gone.test/x", "X")
            .unwrap();
        store
            .insert_if_absent("https://ex.test/", "https://ex.test/a", "A")
            .unwrap();

        let ctx = context(store);

        assert!(ctx.store.items_for_source("https://gone.test/").unwrap().is_empty());
        assert_eq!(ctx.store.items_for_source("https://ex.test/").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_check_all_then_read_workflow() {
        let ctx = context(SqliteStore::in_memory().unwrap());
        let mut sink: Vec<(String, Vec<Item>)> = Vec::new();

        let summary = ctx.check_all(&mut sink).await;
        assert_eq!(
            summary,
            CheckSummary {
                sources: 2,
                sources_with_items: 1,
                new_items: 2
            }
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].0, "https://ex.test/");
        assert_eq!(sink[0].1[1].url, "https://ex.test/b");

        let inbox = ctx.inbox();
        assert!(inbox.mark_read("https://ex.test/a").unwrap());

        let mut second: Vec<(String, Vec<Item>)> = Vec::new();
        let summary = ctx.check_all(&mut second).await;
        assert_eq!(summary.new_items, 0);
        assert_eq!(inbox.unread(None).unwrap().len(), 1);
        assert_eq!(inbox.recent_reads(5, None).unwrap()[0].url, "https://ex.test/a");

        drop(inbox);
        ctx.shutdown().unwrap();
    }

    #[test]
    fn test_db_path_parent_created() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("state").join("state.sqlite3");
        let mut config = config();
        config.state.db_path = Some(db_path.clone());

        let ctx = AppContext::new(config, None).unwrap();
        ctx.shutdown().unwrap();

        assert!(db_path.exists());
    }

    #[test]
    fn test_workers_override() {
        let mut config = config();
        config.fetch.max_concurrency = Some(3);
        let ctx = AppContext::with_parts(
            config,
            SqliteStore::in_memory().unwrap(),
            Arc::new(StaticFetcher),
            Some(1),
        );
        assert!(ctx.is_ok());
    }
}
