//! legal-api server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `LEGAL_API_*` environment variables, opens both SQLite databases, and
//! serves the legal API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an account's `password_hash`:
//!
//! ```
//! cargo run -p registry-legal-api --bin legal-api -- --hash-password
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use registry_legal_api::{AppState, LegalApiConfig, auth::AuthConfig, payment::PaymentClient};
use registry_store_sqlite::{ColinDb, LegalDb};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Business registry legal API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LEGAL_API"))
    .build()
    .context("failed to read config file")?;

  let cfg: LegalApiConfig = settings
    .try_deserialize()
    .context("failed to deserialise LegalApiConfig")?;

  let colin = ColinDb::open(&cfg.colin_db_path)
    .await
    .with_context(|| format!("failed to open colin db at {:?}", cfg.colin_db_path))?;
  let legal = LegalDb::open(&cfg.legal_db_path)
    .await
    .with_context(|| format!("failed to open legal db at {:?}", cfg.legal_db_path))?;
  let payment = PaymentClient::new(cfg.payment_url.clone(), cfg.payment_token.clone())
    .context("failed to build payment client")?;

  if cfg.accounts.is_empty() {
    tracing::warn!("no accounts configured; every filing submission will be rejected");
  }

  let state = AppState {
    colin:   Arc::new(colin),
    legal:   Arc::new(legal),
    payment: Arc::new(payment),
    auth:    Arc::new(AuthConfig { accounts: cfg.accounts.clone() }),
  };

  let app = registry_legal_api::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
