//! The native route tree and the named-urlconf registry.
//!
//! A [`RouteNode`] tree is the live representation on both sides of the
//! export/import boundary: the exporter walks one, and the importer builds
//! one and registers it under a urlconf name. Registered trees exist for
//! name-based URL generation only; nothing here matches requests.
//!
//! The registry is explicit and injectable rather than process-global, so
//! tests construct a fresh one instead of cleaning up shared state. Each
//! registration builds a reverse-resolution index (qualified name to path
//! segments); replacing a urlconf discards and rebuilds that cached state,
//! while appending merges new entries without displacing existing ones.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::error::DataError;
use crate::pattern::{LocalePrefix, PatternKind, RoutePattern};

/// One node of a routing table.
#[derive(Debug, Clone)]
pub enum RouteNode {
    /// A single endpoint. A leaf with no name is unreachable by name-based
    /// lookup and is dropped during export.
    Leaf {
        /// The endpoint name, if any.
        name: Option<String>,
        /// The matching pattern.
        pattern: RoutePattern,
    },
    /// An included sub-tree. Child order is significant: it determines
    /// first-match-wins resolution priority.
    Branch {
        /// The prefix pattern of the include.
        pattern: RoutePattern,
        /// The application name of the included tree, if any.
        app_name: Option<String>,
        /// The namespace qualifying child names, if any.
        namespace: Option<String>,
        /// The included nodes, in priority order.
        children: Vec<RouteNode>,
    },
    /// A branch whose prefix is derived from the active language.
    LocaleBranch {
        /// The fully-qualified identifier of the prefix implementation.
        class_path: String,
        /// The prefix implementation.
        prefix: Arc<dyn LocalePrefix>,
        /// The included nodes, in priority order.
        children: Vec<RouteNode>,
    },
}

impl RouteNode {
    /// A named endpoint.
    pub fn leaf(name: impl Into<String>, pattern: RoutePattern) -> Self {
        Self::Leaf {
            name: Some(name.into()),
            pattern,
        }
    }

    /// An endpoint without a name. Never exported.
    #[must_use]
    pub const fn unnamed_leaf(pattern: RoutePattern) -> Self {
        Self::Leaf {
            name: None,
            pattern,
        }
    }

    /// An include without a namespace.
    #[must_use]
    pub const fn branch(pattern: RoutePattern, children: Vec<RouteNode>) -> Self {
        Self::Branch {
            pattern,
            app_name: None,
            namespace: None,
            children,
        }
    }

    /// An include carrying an app name and namespace.
    #[must_use]
    pub const fn namespaced_branch(
        pattern: RoutePattern,
        app_name: Option<String>,
        namespace: Option<String>,
        children: Vec<RouteNode>,
    ) -> Self {
        Self::Branch {
            pattern,
            app_name,
            namespace,
            children,
        }
    }

    /// A locale-prefixed include using the built-in prefix class.
    #[must_use]
    pub fn locale_branch(children: Vec<RouteNode>) -> Self {
        Self::LocaleBranch {
            class_path: crate::pattern::DEFAULT_LOCALE_PREFIX_CLASS.to_string(),
            prefix: Arc::new(crate::pattern::DefaultLocalePrefix),
            children,
        }
    }
}

/// How an import binds routes to an already-existing urlconf name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Replace the urlconf's route list entirely and rebuild its cached
    /// resolution state. The default.
    #[default]
    Replace,
    /// Add the new routes after any existing ones, preserving the
    /// first-match-wins priority of the originals.
    Append,
}

/// Errors from name-based URL generation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReverseError {
    /// The urlconf name has no registered routes.
    #[error("no urlconf named '{urlconf}' is registered")]
    UnknownUrlconf {
        /// The requested urlconf name.
        urlconf: String,
    },

    /// No route with this (possibly namespace-qualified) name exists.
    #[error("no route named '{name}'")]
    UnknownName {
        /// The requested route name.
        name: String,
    },

    /// The pattern has a named group or placeholder with no matching kwarg.
    #[error("reversing '{name}' requires the kwarg '{kwarg}'")]
    MissingKwarg {
        /// The route being reversed.
        name: String,
        /// The missing keyword argument.
        kwarg: String,
    },

    /// The pattern contains regex constructs a URL cannot be built from,
    /// such as unnamed capture groups.
    #[error("cannot build a URL for '{name}' from pattern '{pattern}'")]
    UnsupportedPattern {
        /// The route being reversed.
        name: String,
        /// The offending pattern text.
        pattern: String,
    },

    /// Pattern evaluation failed.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// One step on the path from the tree root to a leaf, kept in the reverse
/// index so generation does not re-walk the tree.
#[derive(Debug, Clone)]
enum ReverseSegment {
    Pattern(RoutePattern),
    Locale(Arc<dyn LocalePrefix>),
}

#[derive(Debug, Default)]
struct Urlconf {
    routes: Vec<RouteNode>,
    index: HashMap<String, Vec<ReverseSegment>>,
}

/// The process-wide mapping from urlconf names to registered route lists.
#[derive(Debug, Default)]
pub struct UrlconfRegistry {
    urlconfs: HashMap<String, Urlconf>,
}

impl UrlconfRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `routes` under `urlconf`, creating the entry if it does not
    /// exist yet.
    pub fn register(&mut self, urlconf: &str, routes: Vec<RouteNode>, policy: RegistrationPolicy) {
        let count = routes.len();
        match policy {
            RegistrationPolicy::Replace => {
                let index = build_index(&routes);
                self.urlconfs
                    .insert(urlconf.to_string(), Urlconf { routes, index });
            },
            RegistrationPolicy::Append => {
                let entry = self.urlconfs.entry(urlconf.to_string()).or_default();
                for (name, segments) in build_index(&routes) {
                    entry.index.entry(name).or_insert(segments);
                }
                entry.routes.extend(routes);
            },
        }
        tracing::info!(urlconf, count, ?policy, "registered urlconf routes");
    }

    /// The registered route list for `urlconf`, if any.
    #[must_use]
    pub fn routes(&self, urlconf: &str) -> Option<&[RouteNode]> {
        self.urlconfs
            .get(urlconf)
            .map(|entry| entry.routes.as_slice())
    }

    /// Returns whether `urlconf` has registered routes.
    #[must_use]
    pub fn contains(&self, urlconf: &str) -> bool {
        self.urlconfs.contains_key(urlconf)
    }

    /// Generates the URL for a route name under the active language.
    ///
    /// `name` may be namespace-qualified, e.g. `"admin:edit"`. The result is
    /// rooted: `/` plus each path segment's contribution, with named capture
    /// groups and route placeholders substituted from `kwargs`.
    ///
    /// # Errors
    ///
    /// See [`ReverseError`].
    pub fn reverse(
        &self,
        urlconf: &str,
        name: &str,
        language: &str,
        kwargs: &BTreeMap<String, String>,
    ) -> Result<String, ReverseError> {
        let entry =
            self.urlconfs
                .get(urlconf)
                .ok_or_else(|| ReverseError::UnknownUrlconf {
                    urlconf: urlconf.to_string(),
                })?;
        let segments = entry
            .index
            .get(name)
            .ok_or_else(|| ReverseError::UnknownName {
                name: name.to_string(),
            })?;

        let mut url = String::from("/");
        for segment in segments {
            match segment {
                ReverseSegment::Locale(prefix) => url.push_str(&prefix.prefix(language)),
                ReverseSegment::Pattern(pattern) => {
                    url.push_str(&pattern_fragment(pattern, language, name, kwargs)?);
                },
            }
        }
        Ok(url)
    }
}

fn build_index(routes: &[RouteNode]) -> HashMap<String, Vec<ReverseSegment>> {
    let mut index = HashMap::new();
    let mut namespaces = Vec::new();
    let mut segments = Vec::new();
    collect(routes, &mut namespaces, &mut segments, &mut index);
    index
}

fn collect(
    nodes: &[RouteNode],
    namespaces: &mut Vec<String>,
    segments: &mut Vec<ReverseSegment>,
    index: &mut HashMap<String, Vec<ReverseSegment>>,
) {
    for node in nodes {
        match node {
            RouteNode::Leaf {
                name: Some(name),
                pattern,
            } => {
                let mut qualified = namespaces.join(":");
                if !qualified.is_empty() {
                    qualified.push(':');
                }
                qualified.push_str(name);

                let mut path = segments.clone();
                path.push(ReverseSegment::Pattern(pattern.clone()));
                // First match wins: an earlier route keeps its entry.
                index.entry(qualified).or_insert(path);
            },
            RouteNode::Leaf { name: None, .. } => {},
            RouteNode::Branch {
                pattern,
                namespace,
                children,
                ..
            } => {
                segments.push(ReverseSegment::Pattern(pattern.clone()));
                let pushed_namespace = if let Some(namespace) = namespace {
                    namespaces.push(namespace.clone());
                    true
                } else {
                    false
                };

                collect(children, namespaces, segments, index);

                if pushed_namespace {
                    namespaces.pop();
                }
                segments.pop();
            },
            RouteNode::LocaleBranch {
                prefix, children, ..
            } => {
                segments.push(ReverseSegment::Locale(Arc::clone(prefix)));
                collect(children, namespaces, segments, index);
                segments.pop();
            },
        }
    }
}

fn pattern_fragment(
    pattern: &RoutePattern,
    language: &str,
    name: &str,
    kwargs: &BTreeMap<String, String>,
) -> Result<String, ReverseError> {
    let text = pattern.text.evaluate(language).map_err(ReverseError::Data)?;
    match pattern.kind {
        PatternKind::Route => route_fragment(text, name, kwargs),
        PatternKind::Regex => regex_fragment(text, name, kwargs),
    }
}

fn route_fragment(
    text: &str,
    name: &str,
    kwargs: &BTreeMap<String, String>,
) -> Result<String, ReverseError> {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail.find('>').ok_or_else(|| DataError::InvalidRoute {
            route: text.to_string(),
        })?;
        let placeholder = &tail[1..end];
        let kwarg = placeholder
            .split_once(':')
            .map_or(placeholder, |(_, kwarg)| kwarg);
        let value = kwargs.get(kwarg).ok_or_else(|| ReverseError::MissingKwarg {
            name: name.to_string(),
            kwarg: kwarg.to_string(),
        })?;
        out.push_str(value);
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn regex_fragment(
    text: &str,
    name: &str,
    kwargs: &BTreeMap<String, String>,
) -> Result<String, ReverseError> {
    let unsupported = || ReverseError::UnsupportedPattern {
        name: name.to_string(),
        pattern: text.to_string(),
    };

    let stripped = text.strip_prefix('^').unwrap_or(text);
    let stripped = stripped.strip_suffix('$').unwrap_or(stripped);

    let mut out = String::new();
    let mut rest = stripped;
    while let Some(start) = rest.find("(?P<") {
        push_regex_literal(&rest[..start], &mut out).ok_or_else(unsupported)?;

        let after = &rest[start + 4..];
        let name_end = after.find('>').ok_or_else(unsupported)?;
        let kwarg = &after[..name_end];

        // Walk to the capture group's closing paren, honoring escapes and
        // nesting.
        let bytes = after.as_bytes();
        let mut depth = 1usize;
        let mut escaped = false;
        let mut idx = name_end + 1;
        while idx < bytes.len() && depth > 0 {
            match bytes[idx] {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {},
            }
            idx += 1;
        }
        if depth != 0 {
            return Err(unsupported());
        }

        let value = kwargs.get(kwarg).ok_or_else(|| ReverseError::MissingKwarg {
            name: name.to_string(),
            kwarg: kwarg.to_string(),
        })?;
        out.push_str(value);
        rest = &after[idx..];
    }
    push_regex_literal(rest, &mut out).ok_or_else(unsupported)?;
    Ok(out)
}

/// Appends a literal regex chunk to `out`, undoing escapes. Returns `None`
/// when the chunk contains anything that matches more than one string:
/// unnamed groups, character classes, repetition, alternation, wildcards,
/// or class shorthands like `\d`.
fn push_regex_literal(chunk: &str, out: &mut String) -> Option<()> {
    let mut chars = chunk.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next()?;
                // An escaped alphanumeric is a class shorthand, not an
                // escaped literal.
                if escaped.is_ascii_alphanumeric() {
                    return None;
                }
                out.push(escaped);
            },
            '(' | ')' | '[' | ']' | '{' | '}' | '?' | '*' | '+' | '|' | '.' | '^' | '$' => {
                return None;
            },
            _ => out.push(c),
        }
    }
    Some(())
}
