//! VPN Portal - subscription storefront for V2Ray access
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for server-rendered pages with cookie sessions and rate limiting
//! - Supervised background plugins for expiry sweeps and session cleanup

mod entity;
mod error;
mod plugins;
mod prelude;
mod share;
mod state;
mod sv;
mod utils;

use std::{env, sync::Arc};

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{server, sweeper},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "vpn_portal=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:vpn.db?mode=rwc".into());
  let config = Config::from_env()?;

  info!("Starting VPN Portal v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(&db_url, config).await?);

  let handles = plugins::App::new()
    .register(server::Plugin)
    .register(sweeper::Expiry)
    .register(sweeper::Sessions)
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down...");

  for handle in &handles {
    handle.abort();
  }
  for handle in handles {
    let _ = handle.await;
  }

  Ok(())
}
