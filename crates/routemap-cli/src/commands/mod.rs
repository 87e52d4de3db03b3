//! Subcommand implementations.

pub mod check;
pub mod export;
pub mod import;
pub mod names;

use anyhow::{Context, Result};
use routemap_core::{Importer, LocalePrefixRegistry, RoutemapConfig, UrlconfRegistry};

/// Loads every configured `[[urlconfs]]` document into a fresh registry.
pub fn load_registry(config: &RoutemapConfig) -> Result<UrlconfRegistry> {
    let mut registry = UrlconfRegistry::new();
    let locale_classes = LocalePrefixRegistry::default();
    for source in &config.urlconfs {
        Importer::new(&mut registry, &locale_classes, config)
            .from_file(&source.file, Some(&source.name))
            .with_context(|| {
                format!(
                    "failed to load urlconf '{}' from {}",
                    source.name,
                    source.file.display()
                )
            })?;
    }
    Ok(registry)
}
