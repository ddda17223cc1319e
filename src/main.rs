mod app;
mod cache;
mod commands;
mod config;
mod event;
mod family;
mod logging;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "famlist")]
#[command(about = "A shared family shopping list for the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/famlist/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Six-digit family code to join on start
  #[arg(short, long)]
  family: Option<String>,

  /// Nickname to use when creating or joining a family
  #[arg(short, long)]
  nickname: Option<String>,

  /// Backend to talk to
  #[arg(short, long, value_enum)]
  backend: Option<config::BackendKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line wins over the file
  if let Some(nickname) = args.nickname {
    config.profile.nickname = Some(nickname);
  }
  if let Some(backend) = args.backend {
    config.backend.kind = backend;
  }

  // Hold the guard so buffered log lines are flushed on exit
  let _log_guard = logging::init(&config.log)?;

  // Initialize and run the app
  let mut app = app::App::new(config, args.family).await?;
  app.run().await?;

  Ok(())
}
