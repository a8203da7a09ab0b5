//! # joyeria-server
//!
//! REST backend for the Joyería storefront.
//!
//! This binary provides:
//! - **Accounts**: signup and login with bcrypt password hashes, bearer tokens
//!   signed with HS256
//! - **Catalog**: public product listing plus seller-owned create, update and
//!   delete, gated by role and ownership
//! - **Persistence** in a single SQLite file
//! - **Per-IP rate limiting**, CORS and security headers on every response

mod api;
mod auth;
mod catalog;
mod config;
mod error;
mod guard;
mod rate_limit;

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use joyeria_shared::constants::APP_NAME;
use joyeria_store::Database;

use crate::api::AppState;
use crate::config::{ephemeral_secret, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,joyeria_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::from_env();
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET not set, using a random secret; tokens will not survive a restart");
        config.jwt_secret = Some(ephemeral_secret());
    }
    info!(?config, "Loaded configuration");

    let db = Database::open_at(&config.database_path).with_context(|| {
        format!("opening database at {}", config.database_path.display())
    })?;

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, config);

    // Every 5 minutes, forget clients idle for 10.
    let limiter = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.purge_stale(Duration::from_secs(600)).await;
        }
    });

    if let Err(e) = api::serve(app_state, http_addr).await {
        tracing::error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    Ok(())
}
