//! Inliner configuration.

use std::path::PathBuf;

/// Inliner configuration.
///
/// The listed stylesheets are always applied, before any stylesheet an
/// HTML body links to. They are read once when the [`crate::Inliner`] is
/// created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Stylesheet files included for every message, in order.
    pub stylesheets: Vec<PathBuf>,
}

impl Config {
    /// Creates a configuration without global stylesheets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stylesheets: Vec::new(),
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for inliner configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    stylesheets: Vec<PathBuf>,
}

impl ConfigBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stylesheets: Vec::new(),
        }
    }

    /// Appends a global stylesheet.
    #[must_use]
    pub fn stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.stylesheets.push(path.into());
        self
    }

    /// Appends several global stylesheets, keeping their order.
    #[must_use]
    pub fn stylesheets<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.stylesheets.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            stylesheets: self.stylesheets,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_is_empty() {
        assert!(Config::new().stylesheets.is_empty());
        assert_eq!(Config::new(), Config::default());
    }

    #[test]
    fn test_builder_keeps_order() {
        let config = Config::builder()
            .stylesheet("base.css")
            .stylesheets(["brand.css", "dark.css"])
            .build();

        assert_eq!(
            config.stylesheets,
            vec![
                PathBuf::from("base.css"),
                PathBuf::from("brand.css"),
                PathBuf::from("dark.css"),
            ]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let config: Config =
            serde_json::from_str(r#"{"stylesheets": ["/etc/mail/base.css"]}"#).unwrap();
        assert_eq!(config.stylesheets, vec![PathBuf::from("/etc/mail/base.css")]);

        let empty: Config = serde_json::from_str("{}").unwrap();
        assert!(empty.stylesheets.is_empty());
    }
}
