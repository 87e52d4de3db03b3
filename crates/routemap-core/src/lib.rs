//! Portable export and import of a web service's URL routing table.
//!
//! One service serializes its named route tree to a JSON document; another
//! reconstructs the tree from that document and generates URLs by name, so
//! cross-service links never hard-code paths. The document carries matching
//! patterns (route or regex syntax, optionally per-language), include
//! nesting with namespaces, and locale-prefix markers; it carries no handler
//! or middleware state, so reconstructed routes serve URL generation only.
//!
//! The expected flow:
//!
//! 1. The owning service walks its [`routes::UrlconfRegistry`] with
//!    [`export::as_json`], applying allow/deny name filters.
//! 2. The document travels as a file, an HTTP response, or any other
//!    transport.
//! 3. A consuming service feeds it to [`import::Importer`], which rebuilds
//!    the tree and registers it, then calls
//!    [`routes::UrlconfRegistry::reverse`] to build URLs.
//!
//! The [`qa`] checks run in a service's own test suite to catch translated
//! patterns whose keyword arguments drifted apart.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod import;
pub mod language;
pub mod pattern;
pub mod qa;
pub mod routes;

pub use config::RoutemapConfig;
pub use error::{ConfigError, DataError};
pub use export::{ExportError, ExportOptions};
pub use import::{ImportError, Importer};
pub use pattern::{LocalePrefix, LocalePrefixRegistry, PatternKind, PatternText, RoutePattern};
pub use routes::{RegistrationPolicy, ReverseError, RouteNode, UrlconfRegistry};
