//! Validate a route document by reconstructing it.
//!
//! Runs the same reconstruction a consuming service would, then lists the
//! names that came through, so a document can be checked before shipping.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use routemap_core::{
    ExportOptions, Importer, LocalePrefixRegistry, RegistrationPolicy, RoutemapConfig, export,
};

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Read the document from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Fetch the document from a URI
    #[arg(long)]
    pub uri: Option<String>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Urlconf name to register under (defaults to the configured target)
    #[arg(long)]
    pub urlconf: Option<String>,

    /// Append to already-configured routes instead of replacing them
    #[arg(long)]
    pub append: bool,
}

pub fn run(config: &RoutemapConfig, args: &ImportArgs) -> Result<()> {
    let mut registry = super::load_registry(config)?;
    let locale_classes = LocalePrefixRegistry::default();
    let policy = if args.append {
        RegistrationPolicy::Append
    } else {
        RegistrationPolicy::Replace
    };

    let mut importer =
        Importer::new(&mut registry, &locale_classes, config).with_policy(policy);
    let urlconf = args.urlconf.as_deref();
    match (&args.source.file, &args.source.uri) {
        (Some(file), None) => importer
            .from_file(file, urlconf)
            .with_context(|| format!("failed to import {}", file.display()))?,
        (None, Some(uri)) => importer
            .from_uri(uri, urlconf)
            .with_context(|| format!("failed to import {uri}"))?,
        // clap's group guarantees exactly one source.
        _ => unreachable!("one of --file and --uri is required"),
    }

    let target = urlconf
        .or(config.import.default_urlconf.as_deref())
        .or(config.root_urlconf.as_deref())
        .context("no urlconf given and no default configured")?;
    let names = export::all_allowed_url_names(
        &registry,
        &ExportOptions {
            urlconf: Some(target.to_string()),
            ..ExportOptions::default()
        },
        config,
    )
    .context("reconstructed urlconf failed to re-export")?;

    println!("imported '{target}' with {} name(s):", names.len());
    for name in names {
        println!("  {name}");
    }
    Ok(())
}
