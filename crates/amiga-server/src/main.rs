//! amiga server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API over HTTP.
//!
//! # Bootstrapping a staff account
//!
//! ```
//! cargo run -p amiga-server --bin amiga -- --create-admin root
//! ```
//!
//! The password is read from stdin. The process exits once the user exists.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use amiga_core::{store::BuddyStore, user::{NewUser, validate_username}};
use amiga_server::{AppState, ServerConfig, auth::hash_password};
use amiga_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Amiga weekly buddy rotation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a staff user with this username (password on stdin) and exit.
  #[arg(long, value_name = "USERNAME")]
  create_admin: Option<String>,
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(username) = cli.create_admin {
    return create_admin(&store, username).await;
  }

  let address = server_cfg.address();
  tracing::info!(anchor = ?server_cfg.anchor, "rotation anchor");

  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg),
  };
  let app = amiga_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Insert a staff account. Staff are not folded into the rotation until the
/// next overview request or refresh notices them.
async fn create_admin(store: &SqliteStore, username: String) -> anyhow::Result<()> {
  validate_username(&username)?;
  if store.get_credentials(&username).await?.is_some() {
    anyhow::bail!("username {username:?} is already taken");
  }

  let password = read_password()?;
  if password.is_empty() {
    anyhow::bail!("password must not be empty");
  }

  let user = store
    .add_user(NewUser {
      username,
      password_hash: hash_password(&password)?,
      is_staff: true,
    })
    .await?;
  tracing::info!(user_id = %user.user_id, username = %user.username, "staff user created");
  println!("{}", user.user_id);
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
