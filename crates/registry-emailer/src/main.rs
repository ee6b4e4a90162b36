//! emailer binary.
//!
//! Reads queue messages, one JSON object per line, from stdin and processes
//! each before reading the next.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use registry_emailer::{EmailerConfig, Worker, client::ServiceClient};
use registry_store_sqlite::{ColinDb, LegalDb};
use tokio::io::BufReader;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Business registry notification worker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdin carries the queue.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("EMAILER"))
    .build()
    .context("failed to read config file")?;

  let cfg: EmailerConfig = settings
    .try_deserialize()
    .context("failed to deserialise EmailerConfig")?;

  let colin = ColinDb::open(&cfg.colin_db_path)
    .await
    .with_context(|| format!("failed to open colin db at {:?}", cfg.colin_db_path))?;
  let legal = LegalDb::open(&cfg.legal_db_path)
    .await
    .with_context(|| format!("failed to open legal db at {:?}", cfg.legal_db_path))?;
  let client = ServiceClient::new(cfg.services).context("failed to build http client")?;

  let worker = Worker::new(Arc::new(colin), Arc::new(legal), client)
    .context("failed to load email templates")?;

  tracing::info!("waiting for messages on stdin");
  let sent = registry_emailer::run(&worker, BufReader::new(tokio::io::stdin())).await?;
  tracing::info!(sent, "queue closed");

  Ok(())
}
