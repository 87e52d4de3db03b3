//! Rebuild a route tree from a JSON document and register it.
//!
//! Shape dispatch is by key presence: an entry with `includes` is a branch,
//! an entry with `isLocalePrefix` resolves its `classPath` through the
//! locale-prefix registry, and anything else is a leaf. Reconstructed leaves
//! exist only for name-based URL generation; if they were ever matched
//! against a request they would behave as a catch-all not-found.
//!
//! Import either fully builds and registers the tree, or the registry is not
//! touched at all.

use std::path::Path;

use serde_json::Value;

use crate::config::RoutemapConfig;
use crate::error::{ConfigError, DataError};
use crate::language;
use crate::pattern::{LocalePrefixRegistry, PatternKind, PatternText, RoutePattern};
use crate::routes::{RegistrationPolicy, RouteNode, UrlconfRegistry};

/// Errors from the import pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImportError {
    /// Bad import configuration (missing target, unknown locale class).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A malformed wire entry.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A document file could not be read.
    #[error("failed to read urlconf document")]
    Io(#[from] std::io::Error),

    /// A remote document could not be fetched.
    #[error("failed to fetch urlconf document")]
    Http(#[from] reqwest::Error),

    /// A document is not valid JSON.
    #[error("failed to parse urlconf document")]
    Json(#[from] serde_json::Error),
}

/// Imports JSON route documents into a urlconf registry.
#[derive(Debug)]
pub struct Importer<'a> {
    registry: &'a mut UrlconfRegistry,
    locale_classes: &'a LocalePrefixRegistry,
    config: &'a RoutemapConfig,
    policy: RegistrationPolicy,
}

impl<'a> Importer<'a> {
    /// An importer with the default replace registration policy.
    pub fn new(
        registry: &'a mut UrlconfRegistry,
        locale_classes: &'a LocalePrefixRegistry,
        config: &'a RoutemapConfig,
    ) -> Self {
        Self {
            registry,
            locale_classes,
            config,
            policy: RegistrationPolicy::default(),
        }
    }

    /// Overrides the registration policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rebuilds a route tree from a parsed document and registers it under
    /// `urlconf`, falling back to the configured default target.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingUrlconf`] when neither an explicit
    /// target nor a configured default is available,
    /// [`ConfigError::UnknownLocalePrefixClass`] for unresolved locale
    /// classes, and [`DataError`] values for malformed entries.
    pub fn from_json(
        &mut self,
        document: &[Value],
        urlconf: Option<&str>,
    ) -> Result<(), ImportError> {
        let target = urlconf
            .or(self.config.import.default_urlconf.as_deref())
            .or(self.config.root_urlconf.as_deref())
            .ok_or(ConfigError::MissingUrlconf)?
            .to_string();

        let routes = build_routes(document, self.locale_classes)?;
        self.registry.register(&target, routes, self.policy);
        Ok(())
    }

    /// Reads a document from a file, then delegates to [`Self::from_json`].
    ///
    /// # Errors
    ///
    /// As [`Self::from_json`], plus I/O and JSON parse errors.
    pub fn from_file(&mut self, path: &Path, urlconf: Option<&str>) -> Result<(), ImportError> {
        let content = std::fs::read_to_string(path)?;
        let document: Vec<Value> = serde_json::from_str(&content)?;
        self.from_json(&document, urlconf)
    }

    /// Fetches a document over HTTP, then delegates to [`Self::from_json`].
    ///
    /// One blocking GET with no retry policy; retries belong to the caller.
    ///
    /// # Errors
    ///
    /// As [`Self::from_json`], plus HTTP transport errors.
    pub fn from_uri(&mut self, uri: &str, urlconf: Option<&str>) -> Result<(), ImportError> {
        let document: Vec<Value> = reqwest::blocking::get(uri)?
            .error_for_status()?
            .json()?;
        self.from_json(&document, urlconf)
    }
}

fn build_routes(
    document: &[Value],
    locale_classes: &LocalePrefixRegistry,
) -> Result<Vec<RouteNode>, ImportError> {
    let mut routes = Vec::with_capacity(document.len());
    for entry in document {
        let object = entry
            .as_object()
            .ok_or_else(|| invalid_entry(entry))?;

        if let Some(includes) = object.get("includes") {
            let includes = includes
                .as_array()
                .ok_or_else(|| invalid_entry(entry))?;
            let children = build_routes(includes, locale_classes)?;

            if object
                .get("isLocalePrefix")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                let class_path = object
                    .get("classPath")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid_entry(entry))?;
                let prefix = locale_classes.resolve(class_path)?;
                routes.push(RouteNode::LocaleBranch {
                    class_path: class_path.to_string(),
                    prefix,
                    children,
                });
            } else {
                routes.push(RouteNode::Branch {
                    pattern: extract_pattern(object, entry)?,
                    app_name: string_field(object, "app_name"),
                    namespace: string_field(object, "namespace"),
                    children,
                });
            }
        } else {
            routes.push(RouteNode::Leaf {
                name: string_field(object, "name"),
                pattern: extract_pattern(object, entry)?,
            });
        }
    }
    Ok(routes)
}

/// Extracts the pattern from a wire entry: a `regex` field wins, then a
/// `route` field; neither is a data error. A string value is a literal; an
/// object value is a per-language mapping evaluated lazily at use time.
fn extract_pattern(
    object: &serde_json::Map<String, Value>,
    entry: &Value,
) -> Result<RoutePattern, DataError> {
    for kind in [PatternKind::Regex, PatternKind::Route] {
        let Some(value) = object.get(kind.wire_key()) else {
            continue;
        };
        let text = match value {
            Value::String(text) => PatternText::Literal(text.clone()),
            Value::Object(by_language) => {
                let mut texts = std::collections::BTreeMap::new();
                for (language, text) in by_language {
                    // Reject malformed language keys now; missing languages
                    // stay legal until evaluation.
                    language::includes_country(language)?;
                    let text = text.as_str().ok_or_else(|| data_invalid_entry(entry))?;
                    texts.insert(language.clone(), text.to_string());
                }
                PatternText::ByLanguage(texts)
            },
            _ => return Err(data_invalid_entry(entry)),
        };
        return Ok(RoutePattern { kind, text });
    }
    Err(data_invalid_entry(entry))
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn data_invalid_entry(entry: &Value) -> DataError {
    DataError::InvalidEntry {
        entry: entry.to_string(),
    }
}

fn invalid_entry(entry: &Value) -> ImportError {
    ImportError::Data(data_invalid_entry(entry))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Write;

    use serde_json::json;

    use super::*;
    use crate::pattern::DEFAULT_LOCALE_PREFIX_CLASS;

    fn import_fixture(
        document: &[Value],
        urlconf: Option<&str>,
    ) -> Result<UrlconfRegistry, ImportError> {
        let mut registry = UrlconfRegistry::new();
        let locale_classes = LocalePrefixRegistry::default();
        let config = RoutemapConfig::default();
        Importer::new(&mut registry, &locale_classes, &config).from_json(document, urlconf)?;
        Ok(registry)
    }

    fn no_kwargs() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn imports_route_leaf() {
        let registry =
            import_fixture(&[json!({"route": "login/", "name": "login"})], Some("site")).unwrap();
        assert_eq!(
            registry.reverse("site", "login", "en", &no_kwargs()).unwrap(),
            "/login/"
        );
    }

    #[test]
    fn imports_regex_leaf() {
        let registry =
            import_fixture(&[json!({"regex": "^login/$", "name": "login"})], Some("site")).unwrap();
        assert_eq!(
            registry.reverse("site", "login", "en", &no_kwargs()).unwrap(),
            "/login/"
        );
    }

    #[test]
    fn imports_include_with_namespace() {
        let registry = import_fixture(
            &[json!({
                "regex": "^colors/",
                "namespace": "colors_ns",
                "app_name": "colors_app",
                "includes": [
                    {"regex": "^red/$", "name": "red"},
                    {"regex": "^blue/$", "name": "blue"},
                ],
            })],
            Some("site"),
        )
        .unwrap();
        assert_eq!(
            registry
                .reverse("site", "colors_ns:red", "en", &no_kwargs())
                .unwrap(),
            "/colors/red/"
        );
        assert_eq!(
            registry
                .reverse("site", "colors_ns:blue", "en", &no_kwargs())
                .unwrap(),
            "/colors/blue/"
        );
    }

    #[test]
    fn imports_locale_prefix() {
        let registry = import_fixture(
            &[json!({
                "isLocalePrefix": true,
                "classPath": DEFAULT_LOCALE_PREFIX_CLASS,
                "includes": [{"regex": "^$", "name": "index"}],
            })],
            Some("site"),
        )
        .unwrap();
        assert_eq!(
            registry.reverse("site", "index", "en", &no_kwargs()).unwrap(),
            "/en/"
        );
        assert_eq!(
            registry.reverse("site", "index", "fr", &no_kwargs()).unwrap(),
            "/fr/"
        );
    }

    #[test]
    fn unknown_locale_class_is_a_config_error() {
        let result = import_fixture(
            &[json!({
                "isLocalePrefix": true,
                "classPath": "nonexistent.Class",
                "includes": [{"regex": "^$", "name": "index"}],
            })],
            Some("site"),
        );
        assert!(matches!(
            result,
            Err(ImportError::Config(
                ConfigError::UnknownLocalePrefixClass { .. }
            ))
        ));
    }

    #[test]
    fn imports_multi_language_pattern() {
        let registry = import_fixture(
            &[json!({
                "regex": {"en": "^color/$", "en-gb": "^colour/$", "fr": "^couleur/$"},
                "name": "color",
            })],
            Some("site"),
        )
        .unwrap();
        assert_eq!(
            registry.reverse("site", "color", "en", &no_kwargs()).unwrap(),
            "/color/"
        );
        assert_eq!(
            registry
                .reverse("site", "color", "en-gb", &no_kwargs())
                .unwrap(),
            "/colour/"
        );
        assert_eq!(
            registry.reverse("site", "color", "fr", &no_kwargs()).unwrap(),
            "/couleur/"
        );
    }

    #[test]
    fn missing_language_falls_back_to_base_at_reverse_time() {
        let registry = import_fixture(
            &[json!({"regex": {"en": "^color/$"}, "name": "color"})],
            Some("site"),
        )
        .unwrap();
        // There's no 'en-gb' value so it will use the 'en' value.
        assert_eq!(
            registry
                .reverse("site", "color", "en-gb", &no_kwargs())
                .unwrap(),
            "/color/"
        );
        // No 'de' and no base fallback either: an evaluation-time error.
        assert!(registry.reverse("site", "color", "de", &no_kwargs()).is_err());
    }

    #[test]
    fn entry_without_route_or_regex_is_a_data_error() {
        let result = import_fixture(&[json!({"name": "broken"})], Some("site"));
        assert!(matches!(
            result,
            Err(ImportError::Data(DataError::InvalidEntry { .. }))
        ));
    }

    #[test]
    fn default_target_comes_from_config() {
        let mut registry = UrlconfRegistry::new();
        let locale_classes = LocalePrefixRegistry::default();
        let config = RoutemapConfig::default();
        Importer::new(&mut registry, &locale_classes, &config)
            .from_json(&[json!({"route": "login/", "name": "login"})], None)
            .unwrap();
        assert!(registry.contains("imported_urlconf"));
    }

    #[test]
    fn no_target_anywhere_is_a_config_error() {
        let mut registry = UrlconfRegistry::new();
        let locale_classes = LocalePrefixRegistry::default();
        let config = RoutemapConfig {
            import: crate::config::ImportConfig {
                default_urlconf: None,
            },
            ..RoutemapConfig::default()
        };
        let result = Importer::new(&mut registry, &locale_classes, &config)
            .from_json(&[json!({"route": "login/", "name": "login"})], None);
        assert!(matches!(
            result,
            Err(ImportError::Config(ConfigError::MissingUrlconf))
        ));
    }

    #[test]
    fn failed_import_leaves_registry_untouched() {
        let mut registry = UrlconfRegistry::new();
        let locale_classes = LocalePrefixRegistry::default();
        let config = RoutemapConfig::default();
        let result = Importer::new(&mut registry, &locale_classes, &config).from_json(
            &[
                json!({"route": "ok/", "name": "ok"}),
                json!({"name": "broken"}),
            ],
            Some("site"),
        );
        assert!(result.is_err());
        assert!(!registry.contains("site"));
    }

    #[test]
    fn from_file_reads_and_registers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"route": "login/", "name": "login"}}]"#
        )
        .unwrap();

        let mut registry = UrlconfRegistry::new();
        let locale_classes = LocalePrefixRegistry::default();
        let config = RoutemapConfig::default();
        Importer::new(&mut registry, &locale_classes, &config)
            .from_file(file.path(), Some("site"))
            .unwrap();
        assert_eq!(
            registry.reverse("site", "login", "en", &no_kwargs()).unwrap(),
            "/login/"
        );
    }
}
