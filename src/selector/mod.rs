//! Link and title extraction from fetched documents.
//!
//! Each source carries one or more selector definitions. A definition is
//! written in one of two query dialects:
//!
//! - `xpath`: XPath 1.0
//! - `css`: CSS selectors
//!
//! The source's `document_type` picks the parser. `html` bodies are parsed
//! leniently with html5ever and `xml` bodies strictly with sxd-document.
//! Either dialect runs over either parse.
//!
//! ```toml
//! [[sources.selectors]]
//! kind = "xpath"
//! links = '//a[@class="post-title"]/@href'
//! titles = '//a[@class="post-title"]/text()'
//!
//! [[sources.selectors]]
//! kind = "css"
//! rows = "tr"
//! links = "td:last-child a"
//! titles = ".subdesc"
//! ```
//!
//! Results of all definitions are concatenated in declaration order.

mod css;
mod tree;
mod xpath;

pub use css::CssSelector;
pub use xpath::XPathSelector;

use std::cell::OnceCell;

use scraper::Html;
use serde::{Deserialize, Serialize};
use sxd_document::Package;

use crate::app::{FreshetError, Result};
use crate::domain::{DocumentType, Extraction, Source};

/// A query strategy turning a parsed document into ordered links and titles.
pub trait SelectorStrategy {
    fn select(&self, document: &Document) -> Result<Extraction>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SelectorDef {
    Xpath(XPathSelector),
    Css(CssSelector),
}

impl SelectorStrategy for SelectorDef {
    fn select(&self, document: &Document) -> Result<Extraction> {
        match self {
            SelectorDef::Xpath(selector) => selector.select(document),
            SelectorDef::Css(selector) => selector.select(document),
        }
    }
}

/// A fetched body with lazily built parse trees.
///
/// Several selectors on the same source share one parse per dialect.
pub struct Document {
    text: String,
    document_type: DocumentType,
    html: OnceCell<Html>,
    package: OnceCell<Package>,
}

impl Document {
    pub fn new(body: &[u8], document_type: DocumentType) -> Self {
        let text = String::from_utf8_lossy(body);
        Self {
            text: text.trim_start_matches('\u{feff}').to_string(),
            document_type,
            html: OnceCell::new(),
            package: OnceCell::new(),
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// The tree CSS selectors run over.
    pub fn html(&self) -> Result<&Html> {
        if let Some(html) = self.html.get() {
            return Ok(html);
        }
        let html = match self.document_type {
            DocumentType::Html => Html::parse_document(&self.text),
            DocumentType::Xml => tree::package_to_html(self.package()?),
        };
        Ok(self.html.get_or_init(|| html))
    }

    /// The tree XPath expressions run over.
    pub fn package(&self) -> Result<&Package> {
        if let Some(package) = self.package.get() {
            return Ok(package);
        }
        let package = match self.document_type {
            DocumentType::Html => tree::html_to_package(self.html()?),
            DocumentType::Xml => sxd_document::parser::parse(&self.text).map_err(|e| {
                FreshetError::Selector(format!("document is not well-formed XML: {:?}", e))
            })?,
        };
        Ok(self.package.get_or_init(|| package))
    }
}

/// Run every selector of `source` over `body`.
pub fn extract(source: &Source, body: &[u8]) -> Result<Extraction> {
    let document = Document::new(body, source.document_type);
    let mut extraction = Extraction::default();
    for selector in &source.selectors {
        extraction.extend(selector.select(&document)?);
    }
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <a class="post-title" href="/first">First</a>
        <a class="post-title" href="/second">Second</a>
        <a class="other" href="/ignored">Ignored</a>
    </body></html>"#;

    #[test]
    fn test_extract_concatenates_selectors_in_order() {
        let source = Source::new(
            "https://ex.test/",
            vec![
                SelectorDef::Css(CssSelector::new("a.post-title", "a.post-title")),
                SelectorDef::Css(CssSelector::new("a.other", "a.other")),
            ],
        );
        let extraction = extract(&source, PAGE.as_bytes()).unwrap();
        assert_eq!(extraction.links, vec!["/first", "/second", "/ignored"]);
        assert_eq!(extraction.titles, vec!["First", "Second", "Ignored"]);
    }

    #[test]
    fn test_extract_stops_at_failing_selector() {
        let source = Source::new(
            "https://ex.test/",
            vec![
                SelectorDef::Css(CssSelector::new("a.post-title", "a.post-title")),
                SelectorDef::Css(CssSelector::new("a[", "a")),
            ],
        );
        let err = extract(&source, PAGE.as_bytes()).unwrap_err();
        assert!(matches!(err, FreshetError::Selector(_)));
    }

    #[test]
    fn test_selector_def_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            selectors: Vec<SelectorDef>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"
            [[selectors]]
            kind = "xpath"
            links = "//a/@href"
            titles = "//a/text()"

            [[selectors]]
            kind = "css"
            links = "a"
            titles = "a"
            "#,
        )
        .unwrap();

        assert!(matches!(wrapper.selectors[0], SelectorDef::Xpath(_)));
        match &wrapper.selectors[1] {
            SelectorDef::Css(css) => {
                assert_eq!(css.link_attr, "href");
                assert!(css.rows.is_none());
            }
            other => panic!("expected css selector, got {:?}", other),
        }
    }

    #[test]
    fn test_document_strips_bom() {
        let mut body = "\u{feff}".as_bytes().to_vec();
        body.extend_from_slice(b"<root/>");
        let document = Document::new(&body, DocumentType::Xml);
        assert!(document.package().is_ok());
    }

    #[test]
    fn test_document_type_picks_parser() {
        let page = r#"<!DOCTYPE html><html><head><meta charset=utf-8><title>Blog</title></head>
<body><p>Latest&nbsp;posts<br>
<a class="post-title" href="/p/1">One</a>
<a class="post-title" href="/p/2">Two &amp; three</a>
</body></html>"#;
        let selectors = vec![SelectorDef::Xpath(XPathSelector::new(
            r#"//a[@class="post-title"]/@href"#,
            r#"//a[@class="post-title"]"#,
        ))];

        let html = Source::new("https://ex.test/", selectors.clone());
        let extraction = extract(&html, page.as_bytes()).unwrap();
        assert_eq!(extraction.links, vec!["/p/1", "/p/2"]);
        assert_eq!(extraction.titles, vec!["One", "Two & three"]);

        let mut xml = Source::new("https://ex.test/", selectors);
        xml.document_type = DocumentType::Xml;
        let err = extract(&xml, page.as_bytes()).unwrap_err();
        assert!(matches!(err, FreshetError::Selector(_)));
    }

    #[test]
    fn test_css_over_rss_link_text() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>First</title><link>https://ex.test/1</link></item>
  <item><title>Second</title><link>https://ex.test/2</link></item>
</channel></rss>"#;
        let css = CssSelector::new("item > link", "item > title").link_from_text();
        let mut source = Source::new("https://ex.test/feed", vec![SelectorDef::Css(css)]);
        source.document_type = DocumentType::Xml;

        let extraction = extract(&source, rss.as_bytes()).unwrap();
        assert_eq!(extraction.links, vec!["https://ex.test/1", "https://ex.test/2"]);
        assert_eq!(extraction.titles, vec!["First", "Second"]);
    }
}
