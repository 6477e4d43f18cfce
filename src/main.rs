mod analysis;
mod camera;
mod cli;
mod config;
mod decode;
mod error;
mod model;
mod orchestrator;
mod text_summary;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_tracing(&args.log_level);

    match cli::run(args).await {
        Ok(()) => {
            // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
            std::process::exit(0);
        }
        // The presenter has already printed the notice.
        Err(e) if cli::already_reported(&e) => std::process::exit(1),
        Err(e) => Err(e),
    }
}
