mod config;
mod config_cmd;
mod output;
mod run_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deskcheck",
    version,
    about = "Acceptance checks for a workspace-collaboration API"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checks against a deployment
    Run(run_cmd::RunArgs),

    /// List every check name
    List,

    /// Show or initialize `deskcheck.toml`
    Config(config_cmd::ConfigArgs),
}

/// `RUST_LOG` when set and valid, `warn` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_cmd::run(args).await,
        Commands::List => {
            run_cmd::list();
            Ok(())
        }
        Commands::Config(args) => config_cmd::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
