//! Configuration parsing and defaults.
//!
//! A [`RoutemapConfig`] is TOML-backed and supplies the defaults behind every
//! entry point: the configured language list, the default export root and
//! filters, and the default import target. Explicit arguments always win over
//! configuration, which wins over the hard defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutemapConfig {
    /// The configured language codes, e.g. `["en", "en-gb", "fr"]`.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// The urlconf exports default to, and the import fallback of last
    /// resort.
    #[serde(default)]
    pub root_urlconf: Option<String>,

    /// Export defaults.
    #[serde(default)]
    pub export: ExportConfig,

    /// Import defaults.
    #[serde(default)]
    pub import: ImportConfig,

    /// Route documents to load into the registry at startup, keyed by
    /// urlconf name.
    #[serde(default)]
    pub urlconfs: Vec<UrlconfSource>,
}

impl RoutemapConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The configuration fields as displayable key/value pairs, used to name
    /// the first conflicting key on re-initialization.
    #[must_use]
    pub(crate) fn settings(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("languages", format!("{:?}", self.languages)),
            ("root_urlconf", format!("{:?}", self.root_urlconf)),
            ("export", format!("{:?}", self.export)),
            ("import", format!("{:?}", self.import)),
            ("urlconfs", format!("{:?}", self.urlconfs)),
        ])
    }
}

impl Default for RoutemapConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            root_urlconf: None,
            export: ExportConfig::default(),
            import: ImportConfig::default(),
            urlconfs: Vec::new(),
        }
    }
}

/// Export defaults: filters and language keying.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Names and namespaces allowed to be exported.
    #[serde(default)]
    pub allow: Option<Vec<String>>,

    /// Names and namespaces not allowed to be exported.
    #[serde(default)]
    pub deny: Option<Vec<String>>,

    /// Key multi-language patterns by e.g. `"en"` rather than `"en-gb"` and
    /// `"en-us"`.
    #[serde(default)]
    pub language_without_country: bool,
}

/// Import defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// The urlconf imported routes are registered under when no explicit
    /// target is given.
    #[serde(default = "default_import_urlconf")]
    pub default_urlconf: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_urlconf: default_import_urlconf(),
        }
    }
}

/// A route document the CLI loads into the registry at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlconfSource {
    /// The urlconf name to register under.
    pub name: String,
    /// Path to the JSON route document.
    pub file: PathBuf,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_import_urlconf() -> Option<String> {
    Some("imported_urlconf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_minimal() {
        let config = RoutemapConfig::default();
        assert_eq!(config.languages, vec!["en"]);
        assert_eq!(config.root_urlconf, None);
        assert_eq!(
            config.import.default_urlconf.as_deref(),
            Some("imported_urlconf")
        );
        assert!(!config.export.language_without_country);
        assert!(config.export.allow.is_none());
    }

    #[test]
    fn parses_full_config() {
        let config = RoutemapConfig::from_toml(
            r#"
            languages = ["en", "en-gb", "fr"]
            root_urlconf = "site"

            [export]
            allow = ["public-.*"]
            deny = ["secret-.*"]
            language_without_country = true

            [import]
            default_urlconf = "remote_urls"

            [[urlconfs]]
            name = "site"
            file = "routes/site.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.languages, vec!["en", "en-gb", "fr"]);
        assert_eq!(config.root_urlconf.as_deref(), Some("site"));
        assert_eq!(config.export.allow, Some(vec!["public-.*".to_string()]));
        assert!(config.export.language_without_country);
        assert_eq!(config.import.default_urlconf.as_deref(), Some("remote_urls"));
        assert_eq!(config.urlconfs.len(), 1);
        assert_eq!(config.urlconfs[0].name, "site");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = RoutemapConfig::from_toml("").unwrap();
        assert_eq!(config, RoutemapConfig::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = RoutemapConfig::default();
        config.languages = vec!["en".to_string(), "fr".to_string()];
        config.root_urlconf = Some("site".to_string());
        let rendered = config.to_toml().unwrap();
        assert_eq!(RoutemapConfig::from_toml(&rendered).unwrap(), config);
    }
}
