//! Extraction of `<link rel="stylesheet">` references from HTML.

use crate::error::Result;
use crate::html::HtmlDocument;

/// Stylesheet references found in an HTML body, and the body without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// `href` values in document order.
    pub stylesheets: Vec<String>,
    /// HTML with the stylesheet links removed.
    pub html: String,
}

/// Removes every `<link rel="stylesheet">` from `html` and collects its `href`.
///
/// When no stylesheet link is present the input is returned unchanged, so
/// bodies without links never pass through a parse/serialize round trip.
/// A stylesheet link without `href` is removed but yields no reference.
///
/// # Errors
///
/// Returns an error only if the cleaned document cannot be serialized.
pub fn extract_stylesheet_links(html: &str) -> Result<ExtractedLinks> {
    let document = HtmlDocument::parse(html);

    let links: Vec<_> = document
        .elements()
        .filter(|element| &*element.name.local == "link")
        .filter(|element| {
            element
                .attributes
                .borrow()
                .get("rel")
                .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"))
        })
        .collect();

    if links.is_empty() {
        return Ok(ExtractedLinks {
            stylesheets: Vec::new(),
            html: html.to_string(),
        });
    }

    // Nodes are collected first; detaching while traversing would cut the walk short.
    let mut stylesheets = Vec::with_capacity(links.len());
    for link in links {
        if let Some(href) = link.attributes.borrow().get("href") {
            stylesheets.push(href.to_string());
        }
        link.as_node().detach();
    }
    tracing::debug!(count = stylesheets.len(), "Removed stylesheet links");

    Ok(ExtractedLinks {
        stylesheets,
        html: document.to_html()?,
    })
}
