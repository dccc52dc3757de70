//! # mailinline-mime
//!
//! MIME part tree for outgoing email.
//!
//! ## Features
//!
//! - **Part tree**: text leaves, alternative/related/mixed containers and
//!   opaque parts that are carried through byte-for-byte
//! - **Parsing**: build the tree from an RFC 5322 message
//! - **Rendering**: write the tree back out with generated boundaries
//! - **Encoding/Decoding**: Base64 and Quoted-Printable bodies
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailinline_mime::{Headers, Message, Part, TextPart};
//!
//! let mut headers = Headers::new();
//! headers.add("Subject", "Welcome");
//!
//! let message = Message::new(headers).with_body(Part::Alternative(vec![
//!     TextPart::plain("Welcome!").into(),
//!     TextPart::html("<p class=\"lead\">Welcome!</p>").into(),
//! ]));
//!
//! let raw = message.to_string();
//! let parsed = Message::parse(&raw)?;
//! assert_eq!(parsed.body().map(Part::html_parts).map(|p| p.len()), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use encoding::TransferEncoding;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{DEFAULT_CHARSET, Message, OtherPart, Part, TextPart};
