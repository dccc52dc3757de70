//! # mailinline
//!
//! Inlines CSS into the HTML parts of outgoing email right before it is
//! sent, for mail clients that ignore `<style>` and `<link>` elements.
//!
//! ## Features
//!
//! - **Global stylesheets**: configured once, applied to every HTML part
//! - **Linked stylesheets**: `<link rel="stylesheet" href="...">` elements
//!   are removed and the referenced local files are inlined
//! - **Structure preserving**: alternative, related and mixed containers
//!   keep their shape; attachments and other parts pass through untouched
//! - **Send hooks**: [`SendListener`] for [`MessageSending`] and
//!   [`MessageEvent`]; non-MIME messages are skipped
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailinline::{Config, Inliner};
//! use mailinline::mime::{Headers, Message, Part, TextPart};
//!
//! let config = Config::builder().stylesheet("/etc/mail/base.css").build();
//! let inliner = Inliner::new(&config)?;
//!
//! let mut message = Message::new(Headers::new()).with_body(Part::Alternative(vec![
//!     TextPart::plain("Welcome!").into(),
//!     TextPart::html("<link rel=\"stylesheet\" href=\"welcome.css\"><p>Welcome!</p>").into(),
//! ]));
//! inliner.handle_message(&mut message)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod event;
mod inliner;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use event::{Email, MessageEvent, MessageSending, RawMessage, SendListener};
pub use inliner::Inliner;

/// MIME part tree types.
pub use mailinline_mime as mime;

/// Stylesheet loading and inline engines.
pub use mailinline_css as css;
