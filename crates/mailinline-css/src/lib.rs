//! # mailinline-css
//!
//! CSS handling for HTML email bodies.
//!
//! ## Features
//!
//! - **Stylesheet loading**: read local CSS files fresh on every call
//! - **Link extraction**: strip `<link rel="stylesheet">` elements and
//!   collect their targets in document order
//! - **Inlining**: apply stylesheet rules as `style` attributes using
//!   selector specificity and `!important`
//! - **Pluggable engines**: any [`InlineEngine`] can replace the default
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailinline_css::{InlineEngine, StyleInliner, extract_stylesheet_links, load_stylesheets};
//!
//! let extracted = extract_stylesheet_links(html)?;
//! let css = load_stylesheets(&extracted.stylesheets)?;
//! let inlined = StyleInliner::new().inline(&extracted.html, &css)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod engine;
mod error;
mod extract;
mod html;
mod loader;

pub mod stylesheet;

pub use engine::{InlineEngine, StyleInliner};
pub use error::{Error, Result};
pub use extract::{ExtractedLinks, extract_stylesheet_links};
pub use html::HtmlDocument;
pub use loader::load_stylesheets;
