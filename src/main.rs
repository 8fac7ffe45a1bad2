mod api;
mod commands;
mod config;
mod query;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tsk")]
#[command(about = "A command-line client for a task and project management API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tsk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Load configuration and build the client once; everything downstream
  // shares them.
  let config = config::Config::load(args.config.as_deref())?;
  let client = api::ApiClient::new(&config)?;

  commands::run(args.command, client, config.page_size()).await
}
