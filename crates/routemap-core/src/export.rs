//! Export a registered route tree as a portable JSON document.
//!
//! The walk is recursive, depth-first, and children-order-preserving. Three
//! policy outcomes silently drop nodes along the way: leaves without a name
//! (they cannot be regenerated by name), names and namespaces rejected by
//! the allow/deny filter, and branches whose recursive export came back
//! empty. None of these are errors.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};

use crate::config::RoutemapConfig;
use crate::error::{ConfigError, DataError};
use crate::filter::ExportFilter;
use crate::language;
use crate::routes::{RouteNode, UrlconfRegistry};

/// Per-call export options. Unset fields fall back to configuration, then to
/// the hard defaults (no filtering, country-specific language keys).
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// The urlconf to export. Falls back to `root_urlconf` in configuration.
    pub urlconf: Option<String>,
    /// Allow-list of names and namespaces.
    pub allow: Option<Vec<String>>,
    /// Deny-list of names and namespaces.
    pub deny: Option<Vec<String>>,
    /// Key multi-language patterns by base language only.
    pub language_without_country: Option<bool>,
}

/// Errors from the export pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExportError {
    /// Bad export configuration (missing root, invalid filter pattern).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pattern could not be evaluated for some configured language.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The urlconf to export has no registered routes.
    #[error("no urlconf named '{urlconf}' is registered")]
    UnknownUrlconf {
        /// The requested urlconf name.
        urlconf: String,
    },
}

/// Exports a urlconf's route tree as a JSON array.
///
/// # Errors
///
/// Returns [`ExportError::Config`] when no urlconf is named here or in the
/// configuration, or when a filter entry does not compile; and
/// [`ExportError::Data`] when a multi-language pattern cannot be evaluated
/// for a configured language.
pub fn as_json(
    registry: &UrlconfRegistry,
    options: &ExportOptions,
    config: &RoutemapConfig,
) -> Result<Vec<Value>, ExportError> {
    let urlconf = options
        .urlconf
        .as_deref()
        .or(config.root_urlconf.as_deref())
        .ok_or(ConfigError::MissingUrlconf)?;

    let allow = options.allow.as_deref().or(config.export.allow.as_deref());
    let deny = options.deny.as_deref().or(config.export.deny.as_deref());
    let filter = ExportFilter::new(allow, deny)?;

    let language_without_country = options
        .language_without_country
        .unwrap_or(config.export.language_without_country);
    let languages = language::known_languages(&config.languages, language_without_country)?;

    let routes = registry
        .routes(urlconf)
        .ok_or_else(|| ExportError::UnknownUrlconf {
            urlconf: urlconf.to_string(),
        })?;
    walk(routes, &filter, &languages)
}

fn walk(
    nodes: &[RouteNode],
    filter: &ExportFilter,
    languages: &BTreeSet<String>,
) -> Result<Vec<Value>, ExportError> {
    let mut exported = Vec::new();
    for node in nodes {
        match node {
            RouteNode::Leaf { name, pattern } => {
                // Ignore urls without a name; they are typically dead or
                // redirecting, and cannot be reversed anyway.
                let Some(name) = name else {
                    continue;
                };
                if !filter.is_allowed(name) {
                    tracing::debug!(name, "filtered out leaf");
                    continue;
                }
                let mut entry = Map::new();
                entry.insert(
                    pattern.kind.wire_key().to_string(),
                    pattern_value(pattern, languages)?,
                );
                entry.insert("name".to_string(), json!(name));
                exported.push(Value::Object(entry));
            },
            RouteNode::Branch {
                pattern,
                app_name,
                namespace,
                children,
            } => {
                let includes = walk(children, filter, languages)?;
                // An include with nothing live inside it is pruned entirely.
                if includes.is_empty() {
                    tracing::debug!(?namespace, "pruned empty branch");
                    continue;
                }
                if let Some(namespace) = namespace
                    && !filter.is_allowed(namespace)
                {
                    tracing::debug!(namespace, "filtered out namespace");
                    continue;
                }
                let mut entry = Map::new();
                entry.insert(
                    pattern.kind.wire_key().to_string(),
                    pattern_value(pattern, languages)?,
                );
                entry.insert("app_name".to_string(), json!(app_name));
                entry.insert("namespace".to_string(), json!(namespace));
                entry.insert("includes".to_string(), Value::Array(includes));
                exported.push(Value::Object(entry));
            },
            RouteNode::LocaleBranch {
                class_path,
                children,
                ..
            } => {
                let includes = walk(children, filter, languages)?;
                if includes.is_empty() {
                    tracing::debug!(class_path, "pruned empty locale branch");
                    continue;
                }
                // Locale branches carry no pattern text and are never
                // filtered by name.
                exported.push(json!({
                    "isLocalePrefix": true,
                    "classPath": class_path,
                    "includes": includes,
                }));
            },
        }
    }
    Ok(exported)
}

/// The wire value of a pattern's text: a string for literals, a mapping with
/// one entry per known language for multi-language patterns.
fn pattern_value(
    pattern: &crate::pattern::RoutePattern,
    languages: &BTreeSet<String>,
) -> Result<Value, DataError> {
    match &pattern.text {
        crate::pattern::PatternText::Literal(text) => Ok(json!(text)),
        crate::pattern::PatternText::ByLanguage(_) => {
            let mut by_language = BTreeMap::new();
            for language in languages {
                by_language
                    .insert(language.clone(), pattern.text.evaluate(language)?.to_string());
            }
            Ok(json!(by_language))
        },
    }
}

/// Collects every name and namespace present in an exported document.
#[must_use]
pub fn all_exported_url_names(document: &[Value]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for entry in document {
        if let Some(includes) = entry.get("includes").and_then(Value::as_array) {
            if let Some(namespace) = entry.get("namespace").and_then(Value::as_str) {
                names.insert(namespace.to_string());
            }
            names.extend(all_exported_url_names(includes));
        } else if let Some(name) = entry.get("name").and_then(Value::as_str) {
            names.insert(name.to_string());
        }
    }
    names
}

/// Exports, then collects names. Useful to check allow and deny lists are
/// working as expected.
///
/// # Errors
///
/// As [`as_json`].
pub fn all_allowed_url_names(
    registry: &UrlconfRegistry,
    options: &ExportOptions,
    config: &RoutemapConfig,
) -> Result<BTreeSet<String>, ExportError> {
    Ok(all_exported_url_names(&as_json(registry, options, config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{DEFAULT_LOCALE_PREFIX_CLASS, RoutePattern};
    use crate::routes::RegistrationPolicy;

    fn config_with_languages(languages: &[&str]) -> RoutemapConfig {
        RoutemapConfig {
            languages: languages.iter().map(ToString::to_string).collect(),
            root_urlconf: Some("site".to_string()),
            ..RoutemapConfig::default()
        }
    }

    fn registry_with(routes: Vec<RouteNode>) -> UrlconfRegistry {
        let mut registry = UrlconfRegistry::new();
        registry.register("site", routes, RegistrationPolicy::Replace);
        registry
    }

    #[test]
    fn exports_route_leaf() {
        let registry = registry_with(vec![RouteNode::leaf(
            "login",
            RoutePattern::route("login/"),
        )]);
        let config = config_with_languages(&["en"]);
        let exported = as_json(&registry, &ExportOptions::default(), &config).unwrap();
        assert_eq!(exported, vec![json!({"route": "login/", "name": "login"})]);
    }

    #[test]
    fn exports_regex_leaves_in_order() {
        let registry = registry_with(vec![
            RouteNode::leaf("login", RoutePattern::regex("^login/$")),
            RouteNode::leaf("logout", RoutePattern::regex("^logout/$")),
        ]);
        let config = config_with_languages(&["en"]);
        let exported = as_json(&registry, &ExportOptions::default(), &config).unwrap();
        assert_eq!(
            exported,
            vec![
                json!({"regex": "^login/$", "name": "login"}),
                json!({"regex": "^logout/$", "name": "logout"}),
            ]
        );
    }

    #[test]
    fn exports_include_with_null_namespace() {
        let registry = registry_with(vec![RouteNode::branch(
            RoutePattern::regex("^colors/"),
            vec![
                RouteNode::leaf("red", RoutePattern::regex("^red/$")),
                RouteNode::leaf("blue", RoutePattern::regex("^blue/$")),
            ],
        )]);
        let config = config_with_languages(&["en"]);
        let exported = as_json(&registry, &ExportOptions::default(), &config).unwrap();
        assert_eq!(
            exported,
            vec![json!({
                "regex": "^colors/",
                "namespace": null,
                "app_name": null,
                "includes": [
                    {"regex": "^red/$", "name": "red"},
                    {"regex": "^blue/$", "name": "blue"},
                ],
            })]
        );
    }

    #[test]
    fn exports_locale_branch() {
        let registry = registry_with(vec![RouteNode::locale_branch(vec![RouteNode::leaf(
            "index",
            RoutePattern::regex("^$"),
        )])]);
        let config = config_with_languages(&["en"]);
        let exported = as_json(&registry, &ExportOptions::default(), &config).unwrap();
        assert_eq!(
            exported,
            vec![json!({
                "isLocalePrefix": true,
                "classPath": DEFAULT_LOCALE_PREFIX_CLASS,
                "includes": [{"regex": "^$", "name": "index"}],
            })]
        );
    }

    #[test]
    fn exports_multi_language_pattern() {
        let by_language = BTreeMap::from([
            ("en".to_string(), "^color/$".to_string()),
            ("en-gb".to_string(), "^colour/$".to_string()),
            ("fr".to_string(), "^couleur/$".to_string()),
        ]);
        let registry = registry_with(vec![RouteNode::leaf(
            "color",
            RoutePattern::regex_by_language(by_language),
        )]);
        let config = config_with_languages(&["en", "en-gb", "fr"]);

        let exported = as_json(&registry, &ExportOptions::default(), &config).unwrap();
        assert_eq!(
            exported,
            vec![json!({
                "regex": {"en": "^color/$", "en-gb": "^colour/$", "fr": "^couleur/$"},
                "name": "color",
            })]
        );

        let options = ExportOptions {
            language_without_country: Some(true),
            ..ExportOptions::default()
        };
        let exported = as_json(&registry, &options, &config).unwrap();
        assert_eq!(
            exported,
            vec![json!({
                "regex": {"en": "^color/$", "fr": "^couleur/$"},
                "name": "color",
            })]
        );
    }

    #[test]
    fn unnamed_leaf_never_appears() {
        let registry = registry_with(vec![
            RouteNode::unnamed_leaf(RoutePattern::regex("^dead/$")),
            RouteNode::leaf("live", RoutePattern::regex("^live/$")),
        ]);
        let config = config_with_languages(&["en"]);
        let exported = as_json(&registry, &ExportOptions::default(), &config).unwrap();
        assert_eq!(exported, vec![json!({"regex": "^live/$", "name": "live"})]);
    }

    #[test]
    fn missing_urlconf_is_a_config_error() {
        let registry = UrlconfRegistry::new();
        let config = RoutemapConfig::default();
        assert!(matches!(
            as_json(&registry, &ExportOptions::default(), &config),
            Err(ExportError::Config(ConfigError::MissingUrlconf))
        ));
    }

    fn filtering_fixture() -> UrlconfRegistry {
        registry_with(vec![
            RouteNode::leaf("public-a", RoutePattern::regex("^public-a/$")),
            RouteNode::leaf("public-b", RoutePattern::regex("^public-b/$")),
            RouteNode::namespaced_branch(
                RoutePattern::regex("^admin/"),
                Some("admin".to_string()),
                Some("admin".to_string()),
                vec![
                    RouteNode::leaf("secret-1", RoutePattern::regex("^secret-1/$")),
                    RouteNode::leaf("secret-2", RoutePattern::regex("^secret-2/$")),
                    RouteNode::leaf("db-edit", RoutePattern::regex("^db-edit/$")),
                ],
            ),
        ])
    }

    fn allowed_names(allow: &[&str], deny: &[&str]) -> BTreeSet<String> {
        let options = ExportOptions {
            allow: (!allow.is_empty())
                .then(|| allow.iter().map(ToString::to_string).collect()),
            deny: (!deny.is_empty()).then(|| deny.iter().map(ToString::to_string).collect()),
            ..ExportOptions::default()
        };
        let config = config_with_languages(&["en"]);
        all_allowed_url_names(&filtering_fixture(), &options, &config).unwrap()
    }

    fn name_set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_filters_export_everything() {
        assert_eq!(
            allowed_names(&[], &[]),
            name_set(&["public-a", "public-b", "admin", "secret-1", "secret-2", "db-edit"])
        );
    }

    #[test]
    fn deny_excludes_names_and_namespaces() {
        assert_eq!(
            allowed_names(&[], &["db-edit"]),
            name_set(&["public-a", "public-b", "admin", "secret-1", "secret-2"])
        );
        // A denied namespace takes its children with it.
        assert_eq!(
            allowed_names(&[], &["admin"]),
            name_set(&["public-a", "public-b"])
        );
        // Deny entries are regexes.
        assert_eq!(
            allowed_names(&[], &["secret-."]),
            name_set(&["public-a", "public-b", "admin", "db-edit"])
        );
    }

    #[test]
    fn allow_restricts_to_matches() {
        assert_eq!(allowed_names(&["public-a"], &[]), name_set(&["public-a"]));
        // Allow entries are regexes.
        assert_eq!(
            allowed_names(&["public-."], &[]),
            name_set(&["public-a", "public-b"])
        );
    }

    #[test]
    fn deny_overrides_allow() {
        assert_eq!(
            allowed_names(&["public-."], &["public-a"]),
            name_set(&["public-b"])
        );
    }

    #[test]
    fn empty_allowed_namespace_is_pruned() {
        // Allow-listing only the namespace leaves it with no live children,
        // so the namespace itself never appears either.
        assert_eq!(allowed_names(&["admin"], &[]), name_set(&[]));
        // Allow-listing only the children fails the namespace check instead.
        assert_eq!(allowed_names(&["secret-."], &[]), name_set(&[]));
        // Both are needed.
        assert_eq!(
            allowed_names(&["admin", "secret-."], &[]),
            name_set(&["admin", "secret-1", "secret-2"])
        );
    }
}
