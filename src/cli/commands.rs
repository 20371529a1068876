use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use crate::app::{AppContext, FreshetError, Result};
use crate::domain::Item;
use crate::inbox::ItemSink;
use crate::store::Store;

/// Prints each batch of new items as it arrives.
struct StdoutSink;

impl ItemSink for StdoutSink {
    fn on_new_items(&mut self, source_url: &str, items: &[Item]) {
        if items.is_empty() {
            return;
        }
        println!("\n{}", source_url);
        for item in items {
            println!("  ● {}\n    {}", item.display_title(), item.url);
        }
    }
}

pub async fn check(ctx: &AppContext) -> Result<()> {
    if ctx.config.sources.is_empty() {
        println!("No sources configured");
        return Ok(());
    }

    println!("Checking {} sources...", ctx.config.sources.len());
    let summary = ctx.check_all(&mut StdoutSink).await;

    println!(
        "\nAll sources checked: {} new items from {} sources",
        summary.new_items, summary.sources_with_items
    );
    Ok(())
}

pub fn read(ctx: &AppContext, url: &str) -> Result<()> {
    if ctx.inbox().mark_read(url)? {
        println!("Marked as read: {}", url);
    } else {
        println!("Not an unread item: {}", url);
    }
    Ok(())
}

pub fn read_all(ctx: &AppContext) -> Result<()> {
    let count = ctx.inbox().mark_all_read()?;
    println!("Marked {} items as read", count);
    Ok(())
}

pub fn list_unread(ctx: &AppContext, source: Option<&str>) -> Result<()> {
    let items = ctx.inbox().unread(source)?;

    if items.is_empty() {
        println!("No unread items");
        return Ok(());
    }

    let mut current_source: Option<&str> = None;
    for item in &items {
        if current_source != Some(item.source_url.as_str()) {
            println!("{}", item.source_url);
            current_source = Some(item.source_url.as_str());
        }
        println!("  ● {}\n    {}", item.display_title(), item.url);
    }

    Ok(())
}

pub fn history(ctx: &AppContext, limit: usize, source: Option<&str>) -> Result<()> {
    let items = ctx.inbox().recent_reads(limit, source)?;

    if items.is_empty() {
        println!("No read items");
        return Ok(());
    }

    for item in items {
        let date = item
            .read_timestamp
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{} {}\n    {}", date, item.display_title(), item.url);
    }

    Ok(())
}

pub fn list_sources(ctx: &AppContext) -> Result<()> {
    if ctx.config.sources.is_empty() {
        println!("No sources configured");
        return Ok(());
    }

    for source in &ctx.config.sources {
        let unread = ctx.store.unread_count(&source.url)?;
        println!(
            "{} ({} unread, {} selectors)",
            source.url,
            unread,
            source.selectors.len()
        );
    }

    Ok(())
}

/// Import a JSON state file of `{source_url: [item_url, ...]}` or
/// `{source_url: {item_url: ...}}`, marking every item read now.
pub fn import_state(ctx: &AppContext, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let entries = parse_state_file(&content)?;

    if entries.is_empty() {
        println!("No items found in {}", path.display());
        return Ok(());
    }

    let now = Utc::now();
    let mut imported = 0;
    for (source_url, item_url) in &entries {
        if ctx.store.import_read(source_url, item_url, now)? {
            imported += 1;
        }
    }

    let configured = ctx.config.source_urls();
    let unconfigured = entries
        .iter()
        .filter(|(source_url, _)| !configured.contains(source_url))
        .count();
    if unconfigured > 0 {
        tracing::warn!(
            "{} imported items belong to unconfigured sources and will be removed on next start",
            unconfigured
        );
    }

    println!(
        "Import complete: {} imported, {} skipped (already exist)",
        imported,
        entries.len() - imported
    );
    Ok(())
}

fn parse_state_file(content: &str) -> Result<Vec<(String, String)>> {
    let Value::Object(sources) = serde_json::from_str::<Value>(content)? else {
        return Err(FreshetError::Other(
            "State file must be a JSON object keyed by source URL".into(),
        ));
    };

    let mut entries = Vec::new();
    for (source_url, items) in sources {
        let urls: Vec<String> = match items {
            Value::Array(urls) => urls
                .into_iter()
                .filter_map(|u| u.as_str().map(String::from))
                .collect(),
            Value::Object(urls) => urls.into_iter().map(|(url, _)| url).collect(),
            other => {
                return Err(FreshetError::Other(format!(
                    "Items of {} must be a list or an object, got {}",
                    source_url, other
                )))
            }
        };
        entries.extend(urls.into_iter().map(|url| (source_url.clone(), url)));
    }

    Ok(entries)
}
