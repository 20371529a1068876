use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::app::{FreshetError, Result};
use crate::domain::Extraction;
use crate::selector::{Document, SelectorStrategy};

/// CSS rule queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CssSelector {
    /// Elements carrying the link attribute
    pub links: String,
    /// Elements whose text (or `title_attr`) is the title
    pub titles: String,
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
    /// Take the link from the element text instead of `link_attr`, as in
    /// RSS `<link>` elements.
    #[serde(default)]
    pub link_text: bool,
    #[serde(default)]
    pub title_attr: Option<String>,
    /// When set, links and titles are looked up inside each matching row,
    /// and rows without a link are skipped.
    #[serde(default)]
    pub rows: Option<String>,
}

fn default_link_attr() -> String {
    "href".to_string()
}

impl CssSelector {
    pub fn new(links: &str, titles: &str) -> Self {
        Self {
            links: links.to_string(),
            titles: titles.to_string(),
            link_attr: default_link_attr(),
            link_text: false,
            title_attr: None,
            rows: None,
        }
    }

    pub fn in_rows(mut self, rows: &str) -> Self {
        self.rows = Some(rows.to_string());
        self
    }

    pub fn link_from_text(mut self) -> Self {
        self.link_text = true;
        self
    }

    fn link_of(&self, element: ElementRef<'_>) -> Option<String> {
        if self.link_text {
            return Some(element.text().collect());
        }
        element.value().attr(&self.link_attr).map(String::from)
    }

    fn title_of(&self, element: ElementRef<'_>) -> Option<String> {
        match &self.title_attr {
            Some(attr) => element.value().attr(attr).map(String::from),
            None => Some(element.text().collect()),
        }
    }
}

impl SelectorStrategy for CssSelector {
    fn select(&self, document: &Document) -> Result<Extraction> {
        let links = parse(&self.links)?;
        let titles = parse(&self.titles)?;
        let html = document.html()?;

        let Some(rows) = &self.rows else {
            return Ok(Extraction::new(
                html.select(&links).filter_map(|el| self.link_of(el)).collect(),
                html.select(&titles).filter_map(|el| self.title_of(el)).collect(),
            ));
        };

        let rows = parse(rows)?;
        let mut extraction = Extraction::default();
        for row in html.select(&rows) {
            let Some(link) = row.select(&links).find_map(|el| self.link_of(el)) else {
                continue;
            };
            extraction.links.push(link);
            // A missing title is left to surface as a link/title count mismatch.
            if let Some(title) = row.select(&titles).find_map(|el| self.title_of(el)) {
                extraction.titles.push(title);
            }
        }
        Ok(extraction)
    }
}

fn parse(query: &str) -> Result<Selector> {
    Selector::parse(query)
        .map_err(|e| FreshetError::Selector(format!("invalid CSS selector {:?}: {:?}", query, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentType;

    const TABLE: &str = r#"<html><body><table>
        <tr><th>Header</th></tr>
        <tr><td><span class="subdesc">Notice one</span></td><td><a href="/n/1">open</a></td></tr>
        <tr><td><span class="subdesc">No link here</span></td><td>-</td></tr>
        <tr><td><span class="subdesc">Notice two</span></td><td><a href="/n/2">open</a></td></tr>
    </table></body></html>"#;

    fn doc(html: &str) -> Document {
        Document::new(html.as_bytes(), DocumentType::Html)
    }

    #[test]
    fn test_links_and_text_titles() {
        let document = doc(r#"<ul>
            <li><a class="t" href="/a">  Alpha </a></li>
            <li><a class="t" href="/b">Beta</a></li>
            <li><a class="t">No href</a></li>
        </ul>"#);
        let extraction = CssSelector::new("a.t", "a.t").select(&document).unwrap();

        assert_eq!(extraction.links, vec!["/a", "/b"]);
        assert_eq!(extraction.titles, vec!["  Alpha ", "Beta", "No href"]);
    }

    #[test]
    fn test_title_attribute() {
        let document = doc(r#"<a href="/a" title="Alpha">x</a><a href="/b" title="Beta">y</a>"#);
        let mut selector = CssSelector::new("a", "a");
        selector.title_attr = Some("title".into());
        let extraction = selector.select(&document).unwrap();

        assert_eq!(extraction.titles, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_rows_skip_rows_without_link() {
        let document = doc(TABLE);
        let extraction = CssSelector::new("td:last-child a", ".subdesc")
            .in_rows("tr")
            .select(&document)
            .unwrap();

        assert_eq!(extraction.links, vec!["/n/1", "/n/2"]);
        assert_eq!(extraction.titles, vec!["Notice one", "Notice two"]);
    }

    #[test]
    fn test_rows_missing_title_yields_mismatch() {
        let document = doc(r#"<table>
            <tr><td><a href="/n/1">open</a></td><td class="d">One</td></tr>
            <tr><td><a href="/n/2">open</a></td></tr>
        </table>"#);
        let extraction = CssSelector::new("a", ".d")
            .in_rows("tr")
            .select(&document)
            .unwrap();

        assert_eq!(extraction.links.len(), 2);
        assert_eq!(extraction.titles.len(), 1);
    }

    #[test]
    fn test_no_match_is_empty() {
        let document = doc("<p>nothing</p>");
        let extraction = CssSelector::new("a.missing", "a.missing")
            .select(&document)
            .unwrap();
        assert!(extraction.is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let document = doc("<p>nothing</p>");
        let err = CssSelector::new("a[", "a").select(&document).unwrap_err();
        assert!(err.to_string().contains("invalid CSS selector"));
    }
}
