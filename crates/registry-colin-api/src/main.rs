//! colin-api server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `COLIN_API_*` environment variables, opens the COLIN database, and serves
//! the adapter over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use registry_colin_api::ColinApiConfig;
use registry_store_sqlite::ColinDb;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "COLIN database adapter")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("COLIN_API"))
    .build()
    .context("failed to read config file")?;

  let cfg: ColinApiConfig = settings
    .try_deserialize()
    .context("failed to deserialise ColinApiConfig")?;

  let store = ColinDb::open(&cfg.db_path)
    .await
    .with_context(|| format!("failed to open colin db at {:?}", cfg.db_path))?;

  let app = registry_colin_api::router(Arc::new(store));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
