//! # Freshet
//!
//! Watches a list of pages and feeds and reports links that were not there
//! the last time it looked.
//!
//! ## Architecture
//!
//! Every configured source runs through the same pipeline, concurrently:
//!
//! ```text
//! Fetcher → Selector → Normalizer → Detector (Store) → Inbox
//! ```
//!
//! - [`fetcher`]: HTTP fetching and the concurrent per-source pipeline
//! - [`selector`]: XPath and CSS link/title extraction
//! - [`normalizer`]: Relative link resolution
//! - [`detector`]: Reconciliation of extracted links with stored state
//! - [`store`]: SQLite persistence of seen and read items
//! - [`inbox`]: New-item callbacks and read/unread handlers
//!
//! ## Quick Start
//!
//! ```bash
//! # Check every source in ~/.config/freshet/config.toml
//! freshet check
//!
//! # Mark an item read
//! freshet read https://example.com/posts/42
//!
//! # Show what was read recently
//! freshet history -n 10
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// HTTP fetcher and pipeline runner.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/freshet/config.toml`.
pub mod config;

/// Change detection for one source's extracted links.
///
/// - [`ChangeDetector`](detector::ChangeDetector): Reconciles and reports new items
/// - [`Detection`](detector::Detection): Fresh items, no match, or malformed extraction
pub mod detector;

/// Core domain models.
///
/// - [`Source`](domain::Source): A watched page with fetch options and selectors
/// - [`Item`](domain::Item): A tracked link with its read timestamp
/// - [`Extraction`](domain::Extraction): Raw links and titles of one fetch
pub mod domain;

/// HTTP fetching and the concurrent pipeline.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for fetching a source
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Yields per-source results
///   as they complete
pub mod fetcher;

/// Presentation boundary: [`ItemSink`](inbox::ItemSink) and [`Inbox`](inbox::Inbox).
pub mod inbox;

/// Resolution of extracted links against the source URL.
pub mod normalizer;

/// Link and title extraction with XPath or CSS selectors.
pub mod selector;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
