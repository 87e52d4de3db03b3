//! URL pattern kinds and their per-language evaluation.
//!
//! A pattern is either a `route` (literal text with `<converter:name>`
//! placeholders) or a `regex`; the two use different wildcard syntaxes and
//! are never conflated. The matching text itself is either a single literal
//! or a per-language mapping evaluated lazily: the active language is looked
//! up first, then its country-less base, and a second miss is a data error at
//! evaluation time rather than at construction time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{ConfigError, DataError};
use crate::language;

/// Which wildcard syntax a pattern's text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Literal text with `<converter:name>` placeholders.
    Route,
    /// A raw regular expression, usually anchored with `^` and `$`.
    Regex,
}

impl PatternKind {
    /// The JSON field name carrying this kind's text on the wire.
    #[must_use]
    pub const fn wire_key(self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Regex => "regex",
        }
    }
}

/// Matching text, either fixed or varying by language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternText {
    /// The same text for every language.
    Literal(String),
    /// A text per language code. Absence of a country-specific key is legal;
    /// evaluation falls back to the country-less form.
    ByLanguage(BTreeMap<String, String>),
}

impl PatternText {
    /// Evaluates the text under `language`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingTranslation`] when neither the language
    /// nor its base form has a variant, and
    /// [`DataError::InvalidLanguageCode`] for malformed codes.
    pub fn evaluate(&self, language: &str) -> Result<&str, DataError> {
        match self {
            Self::Literal(text) => Ok(text),
            Self::ByLanguage(by_language) => {
                if let Some(text) = by_language.get(language) {
                    return Ok(text);
                }
                // Fallback to the language without country, e.g. if "en-gb"
                // is not defined, use the value for "en".
                by_language
                    .get(language::without_country(language)?)
                    .map(String::as_str)
                    .ok_or_else(|| DataError::MissingTranslation {
                        language: language.to_string(),
                    })
            },
        }
    }

    /// Returns whether this text varies by language.
    #[must_use]
    pub const fn is_multi_language(&self) -> bool {
        matches!(self, Self::ByLanguage(_))
    }
}

/// A kind-tagged pattern: the unit both tree walks dispatch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    /// The wildcard syntax of `text`.
    pub kind: PatternKind,
    /// The matching text.
    pub text: PatternText,
}

impl RoutePattern {
    /// A literal route pattern, e.g. `login/` or `user/<int:pk>/`.
    pub fn route(text: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::Route,
            text: PatternText::Literal(text.into()),
        }
    }

    /// A literal regex pattern, e.g. `^login/$`.
    pub fn regex(text: impl Into<String>) -> Self {
        Self {
            kind: PatternKind::Regex,
            text: PatternText::Literal(text.into()),
        }
    }

    /// A route pattern with one text per language.
    #[must_use]
    pub const fn route_by_language(by_language: BTreeMap<String, String>) -> Self {
        Self {
            kind: PatternKind::Route,
            text: PatternText::ByLanguage(by_language),
        }
    }

    /// A regex pattern with one text per language.
    #[must_use]
    pub const fn regex_by_language(by_language: BTreeMap<String, String>) -> Self {
        Self {
            kind: PatternKind::Regex,
            text: PatternText::ByLanguage(by_language),
        }
    }

    /// Compiles the pattern's matching text under `language` into a regex,
    /// translating route placeholders into named capture groups first.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors, and returns
    /// [`DataError::InvalidRegex`] if the resulting text does not compile.
    pub fn compile(&self, language: &str) -> Result<Regex, DataError> {
        let text = self.text.evaluate(language)?;
        let regex_text = match self.kind {
            PatternKind::Regex => text.to_string(),
            PatternKind::Route => route_to_regex(text)?,
        };
        Regex::new(&regex_text).map_err(|source| DataError::InvalidRegex {
            pattern: regex_text,
            source,
        })
    }
}

/// Translates route syntax into an equivalent anchored regex with named
/// groups.
///
/// `user/<int:pk>/` becomes `^user/(?P<pk>[0-9]+)/`. Literal segments are
/// regex-escaped; a placeholder without a converter defaults to `str`.
pub(crate) fn route_to_regex(route: &str) -> Result<String, DataError> {
    let invalid = || DataError::InvalidRoute {
        route: route.to_string(),
    };

    let mut out = String::from("^");
    let mut rest = route;
    while let Some(start) = rest.find('<') {
        let (literal, tail) = rest.split_at(start);
        out.push_str(&regex::escape(literal));

        let end = tail.find('>').ok_or_else(invalid)?;
        let placeholder = &tail[1..end];
        let (converter, name) = placeholder
            .split_once(':')
            .unwrap_or(("str", placeholder));

        let valid_name = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(invalid());
        }

        let group = converter_regex(converter).ok_or_else(|| DataError::UnknownRouteConverter {
            converter: converter.to_string(),
        })?;
        out.push_str("(?P<");
        out.push_str(name);
        out.push('>');
        out.push_str(group);
        out.push(')');

        rest = &tail[end + 1..];
    }
    out.push_str(&regex::escape(rest));
    Ok(out)
}

/// The built-in route placeholder converters.
fn converter_regex(converter: &str) -> Option<&'static str> {
    match converter {
        "str" => Some("[^/]+"),
        "int" => Some("[0-9]+"),
        "slug" => Some("[-a-zA-Z0-9_]+"),
        "uuid" => Some("[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"),
        "path" => Some(".+"),
        _ => None,
    }
}

/// A route segment whose literal text is derived from the active language
/// rather than fixed text.
pub trait LocalePrefix: fmt::Debug + Send + Sync {
    /// The path contribution for `language`, including the trailing slash.
    fn prefix(&self, language: &str) -> String;
}

/// The built-in locale prefix: `"en"` contributes `en/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocalePrefix;

impl LocalePrefix for DefaultLocalePrefix {
    fn prefix(&self, language: &str) -> String {
        format!("{language}/")
    }
}

/// The class identifier of [`DefaultLocalePrefix`] on the wire.
pub const DEFAULT_LOCALE_PREFIX_CLASS: &str = "routemap_core::pattern::DefaultLocalePrefix";

type LocalePrefixFactory = Box<dyn Fn() -> Arc<dyn LocalePrefix> + Send + Sync>;

/// Maps fully-qualified class identifiers to locale-prefix constructors.
///
/// The runtime type-loading of the originating framework is reproduced as an
/// explicit registry populated at process start; unknown identifiers are
/// rejected at reconstruction time rather than resolved dynamically.
pub struct LocalePrefixRegistry {
    factories: HashMap<String, LocalePrefixFactory>,
}

impl LocalePrefixRegistry {
    /// An empty registry with no recognized classes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a constructor under a class identifier, replacing any
    /// previous registration for the same identifier.
    pub fn register<F>(&mut self, class_path: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn LocalePrefix> + Send + Sync + 'static,
    {
        self.factories.insert(class_path.into(), Box::new(factory));
    }

    /// Resolves a class identifier to a fresh locale-prefix instance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLocalePrefixClass`] for identifiers
    /// with no registered constructor.
    pub fn resolve(&self, class_path: &str) -> Result<Arc<dyn LocalePrefix>, ConfigError> {
        self.factories
            .get(class_path)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownLocalePrefixClass {
                class_path: class_path.to_string(),
            })
    }
}

impl Default for LocalePrefixRegistry {
    /// A registry with the built-in prefix class pre-registered.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_LOCALE_PREFIX_CLASS, || {
            Arc::new(DefaultLocalePrefix)
        });
        registry
    }
}

impl fmt::Debug for LocalePrefixRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalePrefixRegistry")
            .field("classes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
