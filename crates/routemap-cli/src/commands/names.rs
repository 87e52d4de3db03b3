//! List the names an export would contain, after filtering.
//!
//! A quick way to check allow and deny lists hide what they are supposed to
//! hide before the document leaves the service.

use anyhow::{Context, Result};
use clap::Args;
use routemap_core::{ExportOptions, RoutemapConfig, export};

#[derive(Args, Debug)]
pub struct NamesArgs {
    /// Urlconf to inspect (defaults to the configured root urlconf)
    #[arg(long)]
    pub urlconf: Option<String>,

    /// Allow-list pattern for names and namespaces (repeatable)
    #[arg(long)]
    pub allow: Vec<String>,

    /// Deny-list pattern for names and namespaces (repeatable)
    #[arg(long)]
    pub deny: Vec<String>,
}

pub fn run(config: &RoutemapConfig, args: &NamesArgs) -> Result<()> {
    let registry = super::load_registry(config)?;
    let options = ExportOptions {
        urlconf: args.urlconf.clone(),
        allow: (!args.allow.is_empty()).then(|| args.allow.clone()),
        deny: (!args.deny.is_empty()).then(|| args.deny.clone()),
        language_without_country: None,
    };
    let names = export::all_allowed_url_names(&registry, &options, config)
        .context("failed to export urlconf")?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}
