//! Language-code helpers and the country-subtag fallback rule.
//!
//! Codes are either a bare base language (`"en"`) or base plus country
//! (`"en-gb"`). Lookup falls back from the country-specific form to the base
//! form, never the other way, and never to a default language.

use std::collections::BTreeSet;

use crate::error::DataError;

/// Returns whether `language` carries a country subtag.
///
/// # Errors
///
/// Returns [`DataError::InvalidLanguageCode`] for codes with more than two
/// hyphen-delimited segments.
pub fn includes_country(language: &str) -> Result<bool, DataError> {
    match language.split('-').count() {
        1 => Ok(false),
        2 => Ok(true),
        _ => Err(DataError::InvalidLanguageCode {
            code: language.to_string(),
        }),
    }
}

/// Strips the country subtag, if any: `"en-gb"` becomes `"en"`, `"fr"` stays
/// `"fr"`.
///
/// # Errors
///
/// Returns [`DataError::InvalidLanguageCode`] for malformed codes.
pub fn without_country(language: &str) -> Result<&str, DataError> {
    if includes_country(language)? {
        Ok(language.split('-').next().unwrap_or(language))
    } else {
        Ok(language)
    }
}

/// The set of languages URLs are keyed by on the wire.
///
/// Some websites translate URLs once per language family (`"en"`) rather than
/// per language + country combination (`"en-gb"`, `"en-us"`). When
/// `language_without_country` is set, country-bearing codes collapse to their
/// base form and duplicates merge.
///
/// # Errors
///
/// Returns [`DataError::InvalidLanguageCode`] if the configured list contains
/// a malformed code.
pub fn known_languages(
    languages: &[String],
    language_without_country: bool,
) -> Result<BTreeSet<String>, DataError> {
    let mut known = BTreeSet::new();
    for language in languages {
        if language_without_country {
            known.insert(without_country(language)?.to_string());
        } else {
            includes_country(language)?;
            known.insert(language.clone());
        }
    }
    Ok(known)
}
