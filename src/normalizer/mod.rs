use url::Url;

use crate::domain::Extraction;

/// Resolves extracted links against the source URL they were found on.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Rewrites every link of `extraction` into an absolute URL, keeping order.
    pub fn normalize(&self, source_url: &str, extraction: Extraction) -> Extraction {
        let Ok(base) = Url::parse(source_url) else {
            tracing::warn!("Source URL {} is not absolute, links left as-is", source_url);
            return extraction;
        };

        let links = extraction
            .links
            .iter()
            .map(|link| resolve(&base, link))
            .collect();

        Extraction {
            links,
            titles: extraction.titles,
        }
    }
}

/// Resolve `raw_link` against `base_url`; on malformed input the link is
/// returned unchanged.
pub fn normalize_link(base_url: &str, raw_link: &str) -> String {
    match Url::parse(base_url) {
        Ok(base) => resolve(&base, raw_link),
        Err(_) => raw_link.to_string(),
    }
}

fn resolve(base: &Url, raw_link: &str) -> String {
    match base.join(raw_link) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Could not resolve {:?} against {}: {}", raw_link, base, e);
            raw_link.to_string()
        }
    }
}
