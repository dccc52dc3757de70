//! Error types for the inliner.

use thiserror::Error;

/// Errors that abort processing of a message.
#[derive(Debug, Error)]
pub enum Error {
    /// A stylesheet could not be loaded or the inline engine failed.
    #[error(transparent)]
    Css(#[from] mailinline_css::Error),

    /// A raw message could not be parsed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailinline_mime::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the error comes from reading a stylesheet file.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Css(mailinline_css::Error::Stylesheet { .. }))
    }
}
