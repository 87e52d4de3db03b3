//! Error taxonomy for the export/import core.
//!
//! Two families cover the whole pipeline:
//!
//! - [`ConfigError`] — fatal, surfaced immediately: a missing registration
//!   target, an unresolved locale-prefix class, a bad filter pattern, or a
//!   conflicting process-wide re-initialization.
//! - [`DataError`] — fatal at the point of use, not necessarily at parse
//!   time: malformed wire entries, invalid language codes, and translations
//!   that are missing when a pattern is finally evaluated.
//!
//! Filtered-out names, pruned empty branches, and unnamed leaves are policy
//! outcomes, not errors; they are dropped silently during export.

use thiserror::Error;

/// Fatal configuration problems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No registration target was given and none is configured.
    #[error(
        "urlconf is not defined. Set `root_urlconf` or `import.default_urlconf` \
         in the configuration, or pass a urlconf name explicitly. Any name is \
         valid; the registry entry is created if it does not exist yet"
    )]
    MissingUrlconf,

    /// A locale-prefix class identifier did not resolve to a registered
    /// implementation.
    #[error("locale prefix class '{class_path}' is not registered")]
    UnknownLocalePrefixClass {
        /// The unresolved identifier from the wire document.
        class_path: String,
    },

    /// An allow/deny filter entry is not a valid regex.
    #[error("invalid filter pattern '{pattern}'")]
    InvalidFilterPattern {
        /// The offending filter entry.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// Process-wide bootstrap was attempted a second time with a different
    /// value for an already-set key.
    #[error(
        "tried to initialize routemap multiple times with different settings: \
         tried to init with {setting} = {requested} but it was already \
         initialized with {setting} = {existing}"
    )]
    ConflictingInit {
        /// Name of the first conflicting configuration field.
        setting: String,
        /// The value already stored.
        existing: String,
        /// The value the second caller asked for.
        requested: String,
    },

    /// A configuration file could not be read.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    /// A configuration value could not be serialized back to TOML.
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
}

/// Malformed routing data, surfaced when the offending value is used.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    /// A language code with more than a base and a country subtag.
    #[error("invalid language code '{code}'")]
    InvalidLanguageCode {
        /// The offending code.
        code: String,
    },

    /// A by-language pattern has neither the active language nor its
    /// country-less fallback.
    #[error("no pattern variant for language '{language}' or its base language")]
    MissingTranslation {
        /// The language that was active at evaluation time.
        language: String,
    },

    /// A wire entry that is not an object, or carries neither a `route` nor
    /// a `regex` field, or carries one with an unusable value.
    #[error("invalid urlconf entry: {entry}")]
    InvalidEntry {
        /// Compact JSON rendering of the offending entry.
        entry: String,
    },

    /// A route-kind pattern with an unterminated or malformed placeholder.
    #[error("invalid route pattern '{route}'")]
    InvalidRoute {
        /// The offending route text.
        route: String,
    },

    /// A route placeholder names a converter this crate does not know.
    #[error("unknown route converter '{converter}'")]
    UnknownRouteConverter {
        /// The converter name from the placeholder.
        converter: String,
    },

    /// A regex-kind pattern that the regex engine rejects.
    #[error("invalid regex pattern '{pattern}'")]
    InvalidRegex {
        /// The offending pattern text.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },
}
