//! Lenient HTML parsing and serialization.
//!
//! html5ever recovers from any malformed input, so parsing never fails and
//! parser diagnostics never leave this module.

use kuchiki::traits::{NodeIterator, TendrilSink};
use kuchiki::{ElementData, NodeDataRef, NodeRef};

use crate::error::{Error, Result};

/// A parsed HTML body that remembers how much of a document it was.
pub struct HtmlDocument {
    root: NodeRef,
    shape: Shape,
}

/// What the source markup spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Started with a doctype or `<html>`.
    Document,
    /// Anything else; records which wrapper tags were written explicitly.
    Fragment { head: bool, body: bool },
}

impl HtmlDocument {
    /// Parses HTML leniently.
    ///
    /// Input whose first tag (after whitespace and comments) is neither a
    /// doctype nor `<html>` is treated as a fragment. It is written back
    /// without the wrapper elements the parser adds, keeping only a
    /// `<head>` or `<body>` the source spelled out.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let markup = strip_comments(&html.to_ascii_lowercase());
        let start = markup.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');

        let shape = if start.starts_with("<!doctype") || starts_with_tag(start, "html") {
            Shape::Document
        } else {
            Shape::Fragment {
                head: has_tag(&markup, "head"),
                body: has_tag(&markup, "body"),
            }
        };

        Self {
            root: kuchiki::parse_html().one(html),
            shape,
        }
    }

    /// Returns true if the source had no document wrapper.
    #[must_use]
    pub const fn is_fragment(&self) -> bool {
        matches!(self.shape, Shape::Fragment { .. })
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeDataRef<ElementData>> {
        self.root.descendants().elements()
    }

    /// Writes the document back to a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if the serializer fails.
    pub fn to_html(&self) -> Result<String> {
        let mut out = Vec::new();

        match self.shape {
            Shape::Document => self.root.serialize(&mut out).map_err(Error::Serialize)?,
            Shape::Fragment { head, body } => {
                // Content such as <style> or <link> lands in <head> when parsed
                // as a fragment; keep it ahead of the body content.
                for (container, explicit) in [("head", head), ("body", body)] {
                    let Ok(element) = self.root.select_first(container) else {
                        continue;
                    };
                    if explicit {
                        element.as_node().serialize(&mut out).map_err(Error::Serialize)?;
                    } else {
                        for child in element.as_node().children() {
                            child.serialize(&mut out).map_err(Error::Serialize)?;
                        }
                    }
                }
            }
        }

        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Removes `<!-- ... -->` comments; an unterminated comment runs to the end.
fn strip_comments(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 4..];
        rest = after.find("-->").map_or("", |close| &after[close + 3..]);
    }
    out.push_str(rest);

    out
}

/// Returns true if `markup` opens with the start tag `name`.
fn starts_with_tag(markup: &str, name: &str) -> bool {
    markup
        .strip_prefix('<')
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|rest| rest.starts_with(|c: char| c == '>' || c == '/' || c.is_ascii_whitespace()))
}

/// Returns true if `markup` contains the start tag `name` anywhere.
fn has_tag(markup: &str, name: &str) -> bool {
    markup
        .match_indices('<')
        .any(|(i, _)| starts_with_tag(&markup[i..], name))
}
