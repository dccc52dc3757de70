//! Part-tree processing.

use std::fmt;

use mailinline_css::{InlineEngine, StyleInliner, extract_stylesheet_links, load_stylesheets};
use mailinline_mime::{DEFAULT_CHARSET, Message, Part, TextPart};

use crate::config::Config;
use crate::error::Result;
use crate::event::{MessageEvent, MessageSending, SendListener};

/// Inlines CSS into the HTML parts of outgoing messages.
///
/// Global stylesheets are read once by [`Inliner::new`]. Stylesheets linked
/// from an HTML body are read again for every part that links them.
///
/// Only the top level of the body tree is walked: the body itself, or the
/// children of a top-level `multipart/mixed`. Inside an alternative every
/// child is a candidate; inside a related part only the first child is.
pub struct Inliner {
    global_css: String,
    engine: Box<dyn InlineEngine>,
}

impl fmt::Debug for Inliner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inliner")
            .field("global_css", &self.global_css.len())
            .finish_non_exhaustive()
    }
}

impl Inliner {
    /// Creates an inliner using the default [`StyleInliner`] engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured stylesheet cannot be read.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_engine(config, StyleInliner::new())
    }

    /// Creates an inliner with a custom engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured stylesheet cannot be read.
    pub fn with_engine(config: &Config, engine: impl InlineEngine + 'static) -> Result<Self> {
        let global_css = load_stylesheets(&config.stylesheets)?;
        tracing::debug!(
            stylesheets = config.stylesheets.len(),
            bytes = global_css.len(),
            "Loaded global stylesheets"
        );

        Ok(Self {
            global_css,
            engine: Box::new(engine),
        })
    }

    /// CSS applied to every HTML part.
    #[must_use]
    pub fn global_css(&self) -> &str {
        &self.global_css
    }

    /// Handles a [`MessageSending`] event. Non-MIME messages are skipped.
    ///
    /// # Errors
    ///
    /// See [`Inliner::handle_message`].
    pub fn handle(&self, event: &mut MessageSending) -> Result<()> {
        match event.message.as_mime_mut() {
            Some(message) => self.handle_message(message),
            None => {
                tracing::trace!("Skipping non-MIME message");
                Ok(())
            }
        }
    }

    /// Handles a [`MessageEvent`]. Non-MIME messages are skipped.
    ///
    /// # Errors
    ///
    /// See [`Inliner::handle_message`].
    pub fn handle_event(&self, event: &mut MessageEvent) -> Result<()> {
        match event.message_mut().as_mime_mut() {
            Some(message) => self.handle_message(message),
            None => {
                tracing::trace!("Skipping non-MIME message");
                Ok(())
            }
        }
    }

    /// Inlines CSS into every HTML part of `message`.
    ///
    /// The new body is built completely before it is installed, so on error
    /// the message is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if a linked stylesheet cannot be read or the engine
    /// fails.
    pub fn handle_message(&self, message: &mut Message) -> Result<()> {
        let Some(body) = message.body() else {
            tracing::trace!("Message has no body");
            return Ok(());
        };

        let replacement = match body {
            Part::Mixed(children) => {
                let mut rebuilt = Vec::with_capacity(children.len());
                for child in children {
                    rebuilt.push(self.transform_part(child)?.unwrap_or_else(|| child.clone()));
                }
                Some(Part::Mixed(rebuilt))
            }
            part => self.transform_part(part)?,
        };

        if let Some(body) = replacement {
            message.set_body(body);
        }
        Ok(())
    }

    /// Transforms a single part.
    ///
    /// Returns `Ok(None)` when the part has no replacement: opaque parts,
    /// non-HTML text, empty related parts and nested mixed parts.
    ///
    /// # Errors
    ///
    /// Returns an error if a linked stylesheet cannot be read or the engine
    /// fails.
    pub fn transform_part(&self, part: &Part) -> Result<Option<Part>> {
        match part {
            Part::Text(text) if text.is_html() => Ok(Some(Part::Text(self.process_html(text)?))),
            Part::Alternative(children) => {
                let children = children
                    .iter()
                    .map(|child| self.process_part(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(Part::Alternative(children)))
            }
            Part::Related(children) => {
                let Some((main, rest)) = children.split_first() else {
                    return Ok(None);
                };
                let mut rebuilt = Vec::with_capacity(children.len());
                rebuilt.push(self.process_part(main)?);
                rebuilt.extend(rest.iter().cloned());
                Ok(Some(Part::Related(rebuilt)))
            }
            Part::Text(_) | Part::Mixed(_) | Part::Other(_) => Ok(None),
        }
    }

    /// Parses a rendered message, inlines its CSS and renders it again.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be parsed or processing fails.
    pub fn inline_raw(&self, raw: &str) -> Result<String> {
        let mut message = Message::parse(raw)?;
        self.handle_message(&mut message)?;
        Ok(message.to_string())
    }

    /// Leaf transform: HTML text is processed, anything else is kept.
    fn process_part(&self, part: &Part) -> Result<Part> {
        match part {
            Part::Text(text) if text.is_html() => Ok(Part::Text(self.process_html(text)?)),
            other => Ok(other.clone()),
        }
    }

    fn process_html(&self, part: &TextPart) -> Result<TextPart> {
        let extracted = extract_stylesheet_links(part.body())?;
        let linked = load_stylesheets(&extracted.stylesheets)?;
        let css = format!("{}\n{linked}", self.global_css);

        let body = self.engine.inline(&extracted.html, &css)?;
        tracing::debug!(
            linked = extracted.stylesheets.len(),
            before = part.body().len(),
            after = body.len(),
            "Inlined HTML part"
        );

        Ok(
            TextPart::new(body, part.charset().unwrap_or(DEFAULT_CHARSET), "html")
                .with_headers(part.headers().clone()),
        )
    }
}

impl SendListener for Inliner {
    fn on_sending(&self, event: &mut MessageSending) -> Result<()> {
        self.handle(event)
    }

    fn on_message(&self, event: &mut MessageEvent) -> Result<()> {
        self.handle_event(event)
    }
}
