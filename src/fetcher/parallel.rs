use std::sync::Arc;

use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::app::{FreshetError, Result};
use crate::detector::{ChangeDetector, Detection};
use crate::domain::{Item, Source};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::selector;
use crate::store::Store;

/// New items found on one source during a check.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source_url: String,
    pub items: Vec<Item>,
}

/// Runs the fetch, extract and detect pipeline for many sources at once.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    semaphore: Option<Arc<Semaphore>>,
}

impl ParallelFetcher {
    /// No limit on simultaneous pipelines.
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
            semaphore: None,
        }
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
            semaphore: Some(Arc::new(Semaphore::new(workers.max(1)))),
        }
    }

    /// Start one pipeline per source and yield batches as they complete.
    ///
    /// Sources whose fetch or selection failed, matched nothing, or produced
    /// mismatched links and titles are logged and left out of the stream.
    pub fn run_all<S: Store + Send + Sync + 'static>(
        &self,
        sources: Vec<Source>,
        store: Arc<S>,
    ) -> BoxStream<'static, SourceBatch> {
        let tasks = FuturesUnordered::new();

        for source in sources {
            let fetcher = self.fetcher.clone();
            let normalizer = self.normalizer.clone();
            let semaphore = self.semaphore.clone();
            let store = store.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => Some(semaphore.acquire_owned().await.ok()?),
                    None => None,
                };

                let result = check_source(&fetcher, &source, store, &normalizer).await;
                report(&source.url, result)
            }));
        }

        tasks
            .filter_map(|joined| async move {
                match joined {
                    Ok(batch) => batch,
                    Err(e) => {
                        tracing::error!("Task join error: {}", e);
                        None
                    }
                }
            })
            .boxed()
    }
}

/// Fetching is the only await point of a pipeline. Parsing and the
/// store transaction run on the blocking pool.
async fn check_source<S: Store + Send + Sync + 'static>(
    fetcher: &Arc<dyn Fetcher + Send + Sync>,
    source: &Source,
    store: Arc<S>,
    normalizer: &Normalizer,
) -> Result<Detection> {
    let body = fetcher.fetch(&source.url, &source.fetch).await?;

    let owned = source.clone();
    let normalizer = normalizer.clone();
    tokio::task::spawn_blocking(move || {
        let extraction = selector::extract(&owned, &body)?;
        let extraction = normalizer.normalize(&owned.url, extraction);
        ChangeDetector::new(store.as_ref()).detect(&owned.url, &extraction)
    })
    .await
    .map_err(|e| FreshetError::Other(format!("Check of {} aborted: {}", source.url, e)))?
}

fn report(source_url: &str, result: Result<Detection>) -> Option<SourceBatch> {
    match result {
        Ok(Detection::Fresh(items)) => Some(SourceBatch {
            source_url: source_url.to_string(),
            items,
        }),
        Ok(Detection::NoMatch) => {
            tracing::info!("No links match on {}", source_url);
            None
        }
        Ok(Detection::Malformed { links, titles }) => {
            tracing::error!(
                "Found {} links but {} titles on {}, skipping",
                links,
                titles,
                source_url
            );
            None
        }
        Err(e) if e.is_transport() => {
            tracing::warn!("{}", e);
            None
        }
        Err(e) => {
            tracing::error!("{} on {}", e, source_url);
            None
        }
    }
}
