//! Allow/deny filtering of route names and namespaces.
//!
//! Filter entries are regexes matched from the start of the name, the same
//! way the export configuration of the originating service uses them. The
//! policy applies to a single flat string (a leaf name or a branch
//! namespace), never to a full qualified path.

use regex::Regex;

use crate::error::ConfigError;

/// A compiled allow/deny policy, constructed once per export call.
#[derive(Debug, Default)]
pub struct ExportFilter {
    allow: Option<Vec<Regex>>,
    deny: Option<Vec<Regex>>,
}

impl ExportFilter {
    /// Compiles a policy from optional allow and deny pattern lists.
    ///
    /// An empty list behaves like an absent one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilterPattern`] if any entry is not a
    /// valid regex.
    pub fn new(allow: Option<&[String]>, deny: Option<&[String]>) -> Result<Self, ConfigError> {
        Ok(Self {
            allow: compile(allow)?,
            deny: compile(deny)?,
        })
    }

    /// Decides whether a name or namespace may be exported.
    ///
    /// Precedence:
    ///
    /// 1. no lists — allowed;
    /// 2. deny only — allowed unless some deny pattern matches;
    /// 3. allow only — allowed if some allow pattern matches;
    /// 4. both — each matching allow pattern is checked against the full
    ///    deny set, and the name is allowed if any of them survives.
    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        match (&self.allow, &self.deny) {
            (None, None) => true,
            (None, Some(deny)) => !deny.iter().any(|pattern| pattern.is_match(name)),
            (Some(allow), None) => allow.iter().any(|pattern| pattern.is_match(name)),
            (Some(allow), Some(deny)) => {
                for allowed_pattern in allow {
                    if allowed_pattern.is_match(name) {
                        // It's allow-listed. Check it's not deny-listed.
                        if !deny.iter().any(|denied_pattern| denied_pattern.is_match(name)) {
                            return true;
                        }
                    }
                }
                false
            },
        }
    }
}

fn compile(patterns: Option<&[String]>) -> Result<Option<Vec<Regex>>, ConfigError> {
    let Some(patterns) = patterns.filter(|patterns| !patterns.is_empty()) else {
        return Ok(None);
    };
    patterns
        .iter()
        .map(|pattern| {
            // Anchor at the start of the name, matching `re.match` semantics
            // of exports produced elsewhere.
            Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
                ConfigError::InvalidFilterPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(allow: &[&str], deny: &[&str]) -> ExportFilter {
        let allow: Vec<String> = allow.iter().map(ToString::to_string).collect();
        let deny: Vec<String> = deny.iter().map(ToString::to_string).collect();
        ExportFilter::new(Some(&allow), Some(&deny)).unwrap()
    }

    #[test]
    fn no_lists_allows_everything() {
        let policy = ExportFilter::new(None, None).unwrap();
        assert!(policy.is_allowed("anything"));
    }

    #[test]
    fn empty_lists_behave_like_absent_lists() {
        let policy = filter(&[], &[]);
        assert!(policy.is_allowed("anything"));
    }

    #[test]
    fn deny_only_excludes_matches() {
        let policy = filter(&[], &["secret-."]);
        assert!(policy.is_allowed("public-a"));
        assert!(!policy.is_allowed("secret-1"));
        assert!(!policy.is_allowed("secret-2"));
    }

    #[test]
    fn allow_only_excludes_everything_else() {
        let policy = filter(&["public-."], &[]);
        assert!(policy.is_allowed("public-a"));
        assert!(policy.is_allowed("public-b"));
        assert!(!policy.is_allowed("admin"));
    }

    #[test]
    fn deny_overrides_allow() {
        let policy = filter(&["public-."], &["public-a"]);
        assert!(!policy.is_allowed("public-a"));
        assert!(policy.is_allowed("public-b"));
    }

    #[test]
    fn patterns_match_from_the_start() {
        let policy = filter(&[], &["admin"]);
        assert!(!policy.is_allowed("administrator"));
        assert!(policy.is_allowed("not-admin"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let bad = vec!["(unclosed".to_string()];
        assert!(matches!(
            ExportFilter::new(Some(&bad), None),
            Err(ConfigError::InvalidFilterPattern { .. })
        ));
    }
}
