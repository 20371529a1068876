//! Conversions between the html5ever tree used for CSS and the sxd tree
//! used for XPath, so either dialect runs over either parse.
//!
//! Only elements, attributes and text are carried over. Names lose their
//! namespace, which lets `//a` match XHTML elements and `link` match
//! `<atom:link>`.

use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, StrTendril};
use sxd_document::dom::{ChildOfElement, ChildOfRoot};
use sxd_document::Package;

/// Copy a lenient HTML parse into an sxd package.
pub(crate) fn html_to_package(html: &Html) -> Package {
    let package = Package::new();
    {
        let document = package.as_document();
        let mut pending = Vec::new();

        for child in html.tree.root().children() {
            if let Some(element) = ElementRef::wrap(child) {
                let copy = document.create_element(element.value().name());
                document.root().append_child(copy);
                pending.push((copy, element));
            }
        }

        while let Some((copy, element)) = pending.pop() {
            for (name, value) in element.value().attrs() {
                copy.set_attribute_value(name, value);
            }
            for child in element.children() {
                match child.value() {
                    Node::Element(inner) => {
                        let child_copy = document.create_element(inner.name());
                        copy.append_child(child_copy);
                        if let Some(child) = ElementRef::wrap(child) {
                            pending.push((child_copy, child));
                        }
                    }
                    Node::Text(text) => copy.append_child(document.create_text(text)),
                    _ => {}
                }
            }
        }
    }
    package
}

/// Copy a strict XML parse into a scraper document.
pub(crate) fn package_to_html(package: &Package) -> Html {
    let mut html = Html::new_document();
    let document = package.as_document();
    let mut pending = Vec::new();

    for child in document.root().children() {
        if let ChildOfRoot::Element(element) = child {
            let id = html.tree.root_mut().append(element_node(element)).id();
            pending.push((id, element));
        }
    }

    while let Some((id, element)) = pending.pop() {
        for child in element.children() {
            let Some(mut parent) = html.tree.get_mut(id) else {
                break;
            };
            match child {
                ChildOfElement::Element(inner) => {
                    let child_id = parent.append(element_node(inner)).id();
                    pending.push((child_id, inner));
                }
                ChildOfElement::Text(text) => {
                    parent.append(Node::Text(Text {
                        text: StrTendril::from(text.text()),
                    }));
                }
                _ => {}
            }
        }
    }
    html
}

fn element_node(element: sxd_document::dom::Element<'_>) -> Node {
    let attributes = element
        .attributes()
        .into_iter()
        .map(|attribute| Attribute {
            name: unqualified(attribute.name().local_part()),
            value: attribute.value().into(),
        })
        .collect();
    Node::Element(Element::new(
        unqualified(element.name().local_part()),
        attributes,
    ))
}

fn unqualified(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}
