//! Export a configured urlconf as a JSON route document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use routemap_core::{ExportOptions, RoutemapConfig, export};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Urlconf to export (defaults to the configured root urlconf)
    #[arg(long)]
    pub urlconf: Option<String>,

    /// Allow-list pattern for names and namespaces (repeatable)
    #[arg(long)]
    pub allow: Vec<String>,

    /// Deny-list pattern for names and namespaces (repeatable)
    #[arg(long)]
    pub deny: Vec<String>,

    /// Key multi-language patterns by base language, e.g. "en" only
    #[arg(long, conflicts_with = "include_country")]
    pub language_without_country: bool,

    /// Key multi-language patterns by full code, e.g. "en-gb" and "en-us"
    #[arg(long)]
    pub include_country: bool,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            urlconf: self.urlconf.clone(),
            allow: (!self.allow.is_empty()).then(|| self.allow.clone()),
            deny: (!self.deny.is_empty()).then(|| self.deny.clone()),
            language_without_country: if self.language_without_country {
                Some(true)
            } else if self.include_country {
                Some(false)
            } else {
                None
            },
        }
    }
}

pub fn run(config: &RoutemapConfig, args: &ExportArgs) -> Result<()> {
    let registry = super::load_registry(config)?;
    let document = export::as_json(&registry, &args.options(), config)
        .context("failed to export urlconf")?;
    let rendered = serde_json::to_string_pretty(&document)?;

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
