use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked link on a source, keyed by `(source_url, url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub source_url: String,
    pub url: String,
    pub title: String,
    pub read_timestamp: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(source_url: &str, url: &str, title: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            read_timestamp: None,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_timestamp.is_some()
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

/// Links and titles as a source's selectors returned them, in document order.
///
/// Links may still be relative; titles are untrimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub links: Vec<String>,
    pub titles: Vec<String>,
}

impl Extraction {
    pub fn new(links: Vec<String>, titles: Vec<String>) -> Self {
        Self { links, titles }
    }

    pub fn extend(&mut self, other: Extraction) {
        self.links.extend(other.links);
        self.titles.extend(other.titles);
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_unread() {
        let item = Item::new("https://ex.test/", "https://ex.test/a", "A");
        assert!(!item.is_read());
        assert_eq!(item.display_title(), "A");
    }

    #[test]
    fn test_display_title_without_title() {
        let item = Item::new("https://ex.test/", "https://ex.test/a", "");
        assert_eq!(item.display_title(), "(Untitled)");
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut first = Extraction::new(vec!["/a".into()], vec!["A".into()]);
        first.extend(Extraction::new(vec!["/b".into()], vec!["B".into()]));
        assert_eq!(first.links, vec!["/a", "/b"]);
        assert_eq!(first.titles, vec!["A", "B"]);
    }

    #[test]
    fn test_emptiness_follows_links() {
        assert!(Extraction::new(vec![], vec!["orphan".into()]).is_empty());
        assert!(!Extraction::new(vec!["/a".into()], vec![]).is_empty());
    }
}
