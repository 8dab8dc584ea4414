use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use deskcheck_e2e::client::TestContext;
use deskcheck_e2e::runner::{self, RunOptions};

use crate::config;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Deployment root, e.g. http://localhost:3000 (overrides config and BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Filter checks by substring
    #[arg(long)]
    pub filter: Option<String>,

    /// Also run checks that change account passwords
    #[arg(long)]
    pub include_destructive: bool,

    /// Checks in flight at once (default from config: 1)
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (default: ./deskcheck.toml, then ~/.config/deskcheck/deskcheck.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut cfg = config::load(args.config.as_deref())?.config;
    if let Some(url) = args.base_url.as_deref() {
        cfg.set_base_url(url);
    }

    let opts = RunOptions {
        filter: args.filter,
        include_destructive: args.include_destructive || cfg.run.include_destructive,
        concurrency: args.concurrency.unwrap_or(cfg.run.concurrency).max(1),
    };
    let base_url = cfg.target.base_url.clone();

    eprintln!("Running checks against {base_url}");
    if cfg.database.mongo_url.is_none() {
        tracing::info!("no MONGO_URL configured; database checks will be skipped");
    }

    let ctx = Arc::new(TestContext::connect(cfg).await?);
    let suite = runner::run_all(ctx, &opts).await;

    match args.format {
        OutputFormat::Text => output::render_text(&suite, &mut std::io::stderr().lock())?,
        OutputFormat::Json => {
            output::render_json(&suite, &base_url, &mut std::io::stdout().lock())?
        }
    }

    if !suite.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

/// Print every registered check; destructive ones are marked.
pub fn list() {
    let common = runner::spec_names(false);
    for name in runner::spec_names(true) {
        if common.contains(&name) {
            println!("{name}");
        } else {
            println!("{name} (destructive)");
        }
    }
}
