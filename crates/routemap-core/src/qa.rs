//! Consistency checks over a live route tree.
//!
//! Both checks walk the whole tree and collect every violation before
//! failing once with a single aggregated report, so one run surfaces all the
//! translation mistakes at once. Intended to be called from a service's own
//! test suite against its native or reconstructed routes.

use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

use crate::error::DataError;
use crate::pattern::{PatternKind, PatternText, RoutePattern, route_to_regex};
use crate::routes::RouteNode;

/// The language whose named capture groups are treated as authoritative.
pub const REFERENCE_LANGUAGE: &str = "en";

/// Leaves under this prefix belong to administrative tooling and are exempt.
const ADMIN_PREFIX: &str = "^admin/";

/// One leaf whose translated patterns disagree on keyword arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationViolation {
    /// The leaf name, if any.
    pub name: Option<String>,
    /// The concatenated matching text from the root to the leaf.
    pub pattern: String,
    /// The offending language.
    pub language: String,
    /// The reference language's named capture groups.
    pub expected: BTreeSet<String>,
    /// The offending language's named capture groups.
    pub actual: BTreeSet<String>,
}

/// One leaf whose pattern contains unnamed (positional) capture groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalArgsViolation {
    /// The leaf name, if any.
    pub name: Option<String>,
    /// The concatenated matching text from the root to the leaf.
    pub pattern: String,
}

/// A QA check failure: either bad data encountered mid-walk, or the full
/// list of violations found.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QaError {
    /// A pattern could not be evaluated or compiled.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Translated patterns with mismatched keyword arguments.
    #[error("{}", translation_report(.0))]
    TranslationMismatches(Vec<TranslationViolation>),

    /// Patterns using unnamed capture groups.
    #[error("{}", positional_args_report(.0))]
    PositionalArgs(Vec<PositionalArgsViolation>),
}

/// Asserts every translated URL has the same keyword arguments in all
/// configured languages.
///
/// Only leaves with a by-language pattern whose reference-language regex has
/// named capture groups are checked. Leaves under the administrative prefix
/// and leaves directly under a locale-prefix branch are exempt.
///
/// # Errors
///
/// Returns [`QaError::TranslationMismatches`] listing every offending leaf,
/// or [`QaError::Data`] if a pattern cannot be compiled at all.
pub fn assert_kwargs_consistent_across_languages(
    routes: &[RouteNode],
    languages: &[String],
) -> Result<(), QaError> {
    let mut violations = Vec::new();
    check_translations(routes, "", false, languages, &mut violations)?;
    if violations.is_empty() {
        Ok(())
    } else {
        Err(QaError::TranslationMismatches(violations))
    }
}

/// Asserts no URL pattern uses unnamed (positional) capture groups.
///
/// Named groups keep translated patterns reorderable; a count mismatch
/// between total and named groups means at least one positional group
/// exists. Leaves under the administrative prefix are exempt.
///
/// # Errors
///
/// Returns [`QaError::PositionalArgs`] listing every offending leaf, or
/// [`QaError::Data`] if a pattern cannot be compiled at all.
pub fn assert_kwargs_not_args(routes: &[RouteNode]) -> Result<(), QaError> {
    let mut violations = Vec::new();
    check_args(routes, "", &mut violations)?;
    if violations.is_empty() {
        Ok(())
    } else {
        Err(QaError::PositionalArgs(violations))
    }
}

fn check_translations(
    nodes: &[RouteNode],
    parent_pattern: &str,
    under_locale: bool,
    languages: &[String],
    violations: &mut Vec<TranslationViolation>,
) -> Result<(), DataError> {
    for node in nodes {
        match node {
            RouteNode::Branch {
                pattern, children, ..
            } => {
                let text = reference_regex_text(pattern)?;
                check_translations(
                    children,
                    &format!("{parent_pattern}{text}"),
                    false,
                    languages,
                    violations,
                )?;
            },
            RouteNode::LocaleBranch {
                prefix, children, ..
            } => {
                let text = prefix.prefix(REFERENCE_LANGUAGE);
                check_translations(
                    children,
                    &format!("{parent_pattern}{text}"),
                    true,
                    languages,
                    violations,
                )?;
            },
            RouteNode::Leaf { name, pattern } => {
                let text = reference_regex_text(pattern)?;
                let full_pattern = format!("{parent_pattern}{text}");
                if full_pattern.starts_with(ADMIN_PREFIX) || under_locale {
                    continue;
                }
                // Only translated patterns can disagree between languages.
                if !pattern.text.is_multi_language() {
                    continue;
                }

                let reference = pattern.compile(REFERENCE_LANGUAGE)?;
                let expected: BTreeSet<String> = reference
                    .capture_names()
                    .flatten()
                    .map(ToString::to_string)
                    .collect();
                // Only URLs with kwargs are worth checking.
                if reference.captures_len() == 1 || expected.is_empty() {
                    continue;
                }

                for language in languages {
                    let actual: BTreeSet<String> = pattern
                        .compile(language)?
                        .capture_names()
                        .flatten()
                        .map(ToString::to_string)
                        .collect();
                    if actual != expected {
                        violations.push(TranslationViolation {
                            name: name.clone(),
                            pattern: full_pattern.clone(),
                            language: language.clone(),
                            expected: expected.clone(),
                            actual,
                        });
                    }
                }
            },
        }
    }
    Ok(())
}

fn check_args(
    nodes: &[RouteNode],
    parent_pattern: &str,
    violations: &mut Vec<PositionalArgsViolation>,
) -> Result<(), DataError> {
    for node in nodes {
        match node {
            RouteNode::Branch {
                pattern, children, ..
            } => {
                let text = reference_regex_text(pattern)?;
                check_args(children, &format!("{parent_pattern}{text}"), violations)?;
            },
            RouteNode::LocaleBranch {
                prefix, children, ..
            } => {
                let text = prefix.prefix(REFERENCE_LANGUAGE);
                check_args(children, &format!("{parent_pattern}{text}"), violations)?;
            },
            RouteNode::Leaf { name, pattern } => {
                let text = reference_regex_text(pattern)?;
                let full_pattern = format!("{parent_pattern}{text}");
                if full_pattern.starts_with(ADMIN_PREFIX) {
                    continue;
                }
                let compiled = Regex::new(&text).map_err(|source| DataError::InvalidRegex {
                    pattern: text.clone(),
                    source,
                })?;
                let total = compiled.captures_len() - 1;
                let named = compiled.capture_names().flatten().count();
                if total > 0 && total != named {
                    violations.push(PositionalArgsViolation {
                        name: name.clone(),
                        pattern: full_pattern,
                    });
                }
            },
        }
    }
    Ok(())
}

/// The matching text of a pattern under the reference language, as regex
/// text. By-language patterns fall back to any available variant so the walk
/// can continue past leaves that lack the reference language entirely.
fn reference_regex_text(pattern: &RoutePattern) -> Result<String, DataError> {
    let text = match &pattern.text {
        PatternText::Literal(text) => text.clone(),
        PatternText::ByLanguage(by_language) => pattern
            .text
            .evaluate(REFERENCE_LANGUAGE)
            .map(ToString::to_string)
            .ok()
            .or_else(|| by_language.values().next().cloned())
            .ok_or_else(|| DataError::MissingTranslation {
                language: REFERENCE_LANGUAGE.to_string(),
            })?,
    };
    match pattern.kind {
        PatternKind::Regex => Ok(text),
        PatternKind::Route => route_to_regex(&text),
    }
}

fn translation_report(violations: &[TranslationViolation]) -> String {
    let mut report = String::from(
        "Found some urls that have not been translated correctly.\n\
         URL keyword arguments should be the same for all languages.\n\
         Here are the errors:\n\n",
    );
    for violation in violations {
        let expected: Vec<&str> = violation.expected.iter().map(String::as_str).collect();
        let actual: Vec<&str> = violation.actual.iter().map(String::as_str).collect();
        report.push_str(&format!(
            "URL NAME: {}\nURL PATTERN: {}\nLANGUAGE: {}\n\
             EXPECTED KWARGS: {}\nACTUAL KWARGS: {}\n\n",
            violation.name.as_deref().unwrap_or("(unnamed)"),
            violation.pattern,
            violation.language,
            expected.join(", "),
            actual.join(", "),
        ));
    }
    report
}

fn positional_args_report(violations: &[PositionalArgsViolation]) -> String {
    let mut report = String::from(
        "Found some urls that include unnamed capture groups (AKA 'url args').\n\
         You need to use named capture groups for all urls (AKA 'url kwargs').\n\n\
         These urls need fixing:\n\n",
    );
    for violation in violations {
        report.push_str(&format!(
            "NAME: {}\nPATTERN: {}\n\n",
            violation.name.as_deref().unwrap_or("(unnamed)"),
            violation.pattern,
        ));
    }
    report
}
