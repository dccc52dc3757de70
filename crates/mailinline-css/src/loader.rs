//! Stylesheet loading from the local file system.

use std::path::Path;

use crate::error::{Error, Result};

/// Reads the given stylesheet files and concatenates them in order.
///
/// A newline is inserted after any file that does not end with one, so the
/// last rule of one file never runs into the first rule of the next. Files
/// are read fresh on every call.
///
/// # Errors
///
/// Returns [`Error::Stylesheet`] for the first path that cannot be read.
pub fn load_stylesheets<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    let mut css = String::new();

    for path in paths {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Stylesheet {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!(path = %path.display(), bytes = content.len(), "Loaded stylesheet");

        css.push_str(&content);
        if !css.is_empty() && !css.ends_with('\n') {
            css.push('\n');
        }
    }

    Ok(css)
}
