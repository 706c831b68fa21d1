// ABOUTME: Token server binary serving the OAuth 2.0 token endpoint and JWKS
// ABOUTME: Loads configuration, signing key, and store seed, then serves over axum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # OAuth2 Entitlements Server Binary
//!
//! Starts the token endpoint with an in-memory store, optionally seeded from a
//! JSON document.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use oauth2_entitlements::{
    config::environment::ServerConfig,
    keys::SigningKey,
    logging,
    oauth2_server::TokenEndpoint,
    routes,
    stores::{InMemoryStore, Stores},
};
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "oauth2-entitlements-server")]
#[command(about = "OAuth 2.0 token server issuing entitlement-bearing access tokens")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// JSON seed for the in-memory store
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if args.seed.is_some() {
        config.store_seed_path = args.seed;
    }

    info!("{}", config.summary());

    let signing_key = SigningKey::load_or_generate(
        config.signing_key_path.as_deref(),
        &config.signing_key_id,
        config.rsa_key_size,
    )
    .await
    .context("Failed to initialize signing key")?;

    let store = match config.store_seed_path.as_deref() {
        Some(path) => InMemoryStore::from_json_file(path)
            .await
            .context("Failed to load store seed")?,
        None => {
            info!("No store seed configured, starting with an empty store");
            InMemoryStore::new()
        }
    };

    let endpoint = TokenEndpoint::new(
        Stores::from_shared(Arc::new(store)),
        config.issuer.clone(),
        Arc::new(signing_key),
    );
    let app = routes::router(Arc::new(endpoint));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind token server on {addr}"))?;
    info!("Token server listening on {addr}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
        return Err(e.into());
    }

    info!("Token server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
