use serde::{Deserialize, Serialize};
use sxd_document::Package;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{evaluate_xpath, Value};

use crate::app::{FreshetError, Result};
use crate::domain::Extraction;
use crate::selector::{Document, SelectorStrategy};

/// XPath path queries.
///
/// Node-sets yield each node's string value in document order, so both
/// `//a/@href` and `//a/text()` work as expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XPathSelector {
    pub links: String,
    pub titles: String,
}

impl XPathSelector {
    pub fn new(links: &str, titles: &str) -> Self {
        Self {
            links: links.to_string(),
            titles: titles.to_string(),
        }
    }
}

impl SelectorStrategy for XPathSelector {
    fn select(&self, document: &Document) -> Result<Extraction> {
        let package = document.package()?;
        Ok(Extraction::new(
            evaluate(package, &self.links)?,
            evaluate(package, &self.titles)?,
        ))
    }
}

fn evaluate(package: &Package, expression: &str) -> Result<Vec<String>> {
    let document = package.as_document();
    let value = evaluate_xpath(&document, expression).map_err(|e| {
        FreshetError::Selector(format!("XPath {:?} failed: {:?}", expression, e))
    })?;

    let strings = match value {
        Value::Nodeset(nodes) => join_adjacent_text(nodes.document_order()),
        scalar => vec![scalar.string()],
    };
    Ok(strings)
}

/// String values of `nodes`, with runs of sibling text nodes joined.
///
/// The XML parser splits text at every entity and character reference,
/// so `a &amp; b` is three text nodes under one element.
fn join_adjacent_text(nodes: Vec<Node<'_>>) -> Vec<String> {
    let mut strings: Vec<String> = Vec::new();
    let mut last_text: Option<Node<'_>> = None;

    for node in nodes {
        let is_text = matches!(node, Node::Text(_));
        let continues = is_text && last_text.is_some_and(|prev| next_sibling(prev) == Some(node));
        let value = node.string_value();
        match strings.last_mut() {
            Some(last) if continues => last.push_str(&value),
            _ => strings.push(value),
        }
        last_text = if is_text { Some(node) } else { None };
    }
    strings
}

fn next_sibling(node: Node<'_>) -> Option<Node<'_>> {
    let siblings = node.parent()?.children();
    let position = siblings.iter().position(|sibling| *sibling == node)?;
    siblings.get(position + 1).copied()
}
