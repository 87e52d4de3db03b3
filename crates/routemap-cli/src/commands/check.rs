//! Translation consistency checks over a configured urlconf.

use anyhow::{Context, Result, bail};
use clap::Args;
use routemap_core::{RoutemapConfig, qa};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Urlconf to check (defaults to the configured root urlconf)
    #[arg(long)]
    pub urlconf: Option<String>,
}

pub fn run(config: &RoutemapConfig, args: &CheckArgs) -> Result<()> {
    let urlconf = args
        .urlconf
        .as_deref()
        .or(config.root_urlconf.as_deref())
        .context("no urlconf given and no root_urlconf configured")?;

    let registry = super::load_registry(config)?;
    let Some(routes) = registry.routes(urlconf) else {
        bail!("no urlconf named '{urlconf}' is configured");
    };

    let mut failed = false;
    match qa::assert_kwargs_consistent_across_languages(routes, &config.languages) {
        Ok(()) => println!("kwargs consistent across languages: OK"),
        Err(report) => {
            failed = true;
            eprintln!("{report}");
        },
    }
    match qa::assert_kwargs_not_args(routes) {
        Ok(()) => println!("no positional args: OK"),
        Err(report) => {
            failed = true;
            eprintln!("{report}");
        },
    }

    if failed {
        bail!("checks failed for urlconf '{urlconf}'");
    }
    Ok(())
}
