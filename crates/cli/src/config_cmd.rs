use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use deskcheck_runtime_config::CONFIG_FILE_NAME;
use std::path::PathBuf;

use crate::config;

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Config file to read or write
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show the effective config, with passwords redacted
    Show,
    /// Write a default `deskcheck.toml` (in the current directory unless --config is given)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => run_show(args.config),
        ConfigAction::Init { force } => run_init(args.config, force),
    }
}

fn run_show(explicit: Option<PathBuf>) -> Result<()> {
    let loaded = config::load(explicit.as_deref())?;
    let source = if loaded.from_file {
        "file"
    } else {
        "defaults, no file found"
    };
    println!("# {} ({source})", loaded.path.display());
    print!("{}", loaded.config.redacted().to_toml_string()?);
    Ok(())
}

fn run_init(explicit: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path,
        None => std::env::current_dir()
            .context("read current directory")?
            .join(CONFIG_FILE_NAME),
    };
    config::init_at(&path, force)?;
    println!("config: {}", path.display());
    Ok(())
}
