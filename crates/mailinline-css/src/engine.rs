//! CSS-to-inline-style engines.

use crate::error::Result;
use crate::html::HtmlDocument;
use crate::stylesheet::{Declaration, Stylesheet, parse_style_attribute};

/// Converts stylesheet rules into `style` attributes.
///
/// Engines are shared between concurrent send invocations, hence the
/// `Send + Sync` bound. Closures with the same signature implement this
/// trait, which is convenient for wrapping another inliner.
pub trait InlineEngine: Send + Sync {
    /// Returns `html` with the rules of `css` applied as inline styles.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails; empty or malformed CSS is not
    /// an error.
    fn inline(&self, html: &str, css: &str) -> Result<String>;
}

impl<F> InlineEngine for F
where
    F: Fn(&str, &str) -> Result<String> + Send + Sync,
{
    fn inline(&self, html: &str, css: &str) -> Result<String> {
        self(html, css)
    }
}

/// Default engine.
///
/// Cascade per element: matching normal declarations by specificity then
/// source order, then the element's own `style` attribute, then matching
/// `!important` declarations. An `!important` declaration already present
/// in the `style` attribute is never replaced, and declarations there that
/// do not parse are kept verbatim at the end.
#[derive(Debug, Default, Clone, Copy)]
pub struct StyleInliner;

impl StyleInliner {
    /// Creates the default engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InlineEngine for StyleInliner {
    fn inline(&self, html: &str, css: &str) -> Result<String> {
        let stylesheet = Stylesheet::parse(css);
        if stylesheet.is_empty() {
            return Ok(html.to_string());
        }

        let document = HtmlDocument::parse(html);
        let mut styled = 0usize;

        for element in document.elements() {
            let mut matched = Vec::new();
            for (order, rule) in stylesheet.rules().iter().enumerate() {
                if let Some(specificity) = rule.matching_specificity(&element) {
                    matched.extend(
                        rule.declarations()
                            .iter()
                            .map(|declaration| (specificity, order, declaration)),
                    );
                }
            }
            if matched.is_empty() {
                continue;
            }
            // Stable: declarations of one rule keep their source order
            matched.sort_by_key(|&(specificity, order, _)| (specificity, order));

            let mut attributes = element.attributes.borrow_mut();
            let existing = attributes
                .get("style")
                .map(parse_style_attribute)
                .unwrap_or_default();

            let mut style = InlineStyle::default();
            for &(_, _, declaration) in matched.iter().filter(|(_, _, d)| !d.important) {
                style.set(declaration);
            }
            for declaration in &existing.declarations {
                style.set(declaration);
            }
            for &(_, _, declaration) in matched.iter().filter(|(_, _, d)| d.important) {
                let pinned = existing
                    .declarations
                    .iter()
                    .any(|e| e.important && e.property == declaration.property);
                if !pinned {
                    style.set(declaration);
                }
            }

            style.unparsed = existing.unparsed;

            attributes.insert("style", style.to_string());
            styled += 1;
        }

        tracing::debug!(rules = stylesheet.len(), elements = styled, "Inlined stylesheet");
        document.to_html()
    }
}

/// Ordered declarations where a later value for a property replaces the
/// earlier one in place. Unparsed source text is written after them.
#[derive(Default)]
struct InlineStyle {
    declarations: Vec<Declaration>,
    unparsed: Vec<String>,
}

impl InlineStyle {
    fn set(&mut self, declaration: &Declaration) {
        match self
            .declarations
            .iter_mut()
            .find(|d| d.property == declaration.property)
        {
            Some(slot) => slot.clone_from(declaration),
            None => self.declarations.push(declaration.clone()),
        }
    }
}

impl std::fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parsed = self.declarations.iter().map(ToString::to_string);
        for (i, text) in parsed.chain(self.unparsed.iter().cloned()).enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&text)?;
        }
        Ok(())
    }
}
