// ABOUTME: Environment-based server configuration
// ABOUTME: Reads ports, signing key location, store seed, and issuer settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use super::oauth::TokenIssuerConfig;
use crate::constants::defaults;

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Token issuer settings
    pub issuer: TokenIssuerConfig,
    /// PKCS#8 PEM signing key; a key is generated when unset
    pub signing_key_path: Option<PathBuf>,
    /// `kid` of the signing key
    pub signing_key_id: String,
    /// Modulus size for a generated signing key
    pub rsa_key_size: usize,
    /// JSON seed for the in-memory store
    pub store_seed_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// | variable | default |
    /// |---|---|
    /// | `HTTP_PORT` | 8081 |
    /// | `OAUTH2_ISSUER_URL` | `http://localhost:<HTTP_PORT>` |
    /// | `ACCESS_TOKEN_TTL_SECS` | 3600 |
    /// | `ASSERTION_LEEWAY_SECS` | 60 |
    /// | `SIGNING_KEY_PATH` | unset |
    /// | `SIGNING_KEY_ID` | `oauth2-signing-key` |
    /// | `RSA_KEY_SIZE` | 4096 |
    /// | `STORE_SEED_PATH` | unset |
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let http_port = match env::var("HTTP_PORT") {
            Ok(raw) => raw.parse().context("Invalid HTTP_PORT value")?,
            Err(_) => defaults::HTTP_PORT,
        };

        let rsa_key_size = match env::var("RSA_KEY_SIZE") {
            Ok(raw) => raw.parse().context("Invalid RSA_KEY_SIZE value")?,
            Err(_) => defaults::RSA_KEY_SIZE,
        };

        Ok(Self {
            http_port,
            issuer: TokenIssuerConfig::from_env(http_port)?,
            signing_key_path: env::var("SIGNING_KEY_PATH").ok().map(PathBuf::from),
            signing_key_id: env_var_or("SIGNING_KEY_ID", defaults::SIGNING_KEY_ID),
            rsa_key_size,
            store_seed_path: env::var("STORE_SEED_PATH").ok().map(PathBuf::from),
        })
    }

    /// One-line-per-setting summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::from("Token Server Configuration:\n");
        let _ = writeln!(summary, " - HTTP Port: {}", self.http_port);
        let _ = writeln!(summary, " - Issuer: {}", self.issuer.issuer);
        let _ = writeln!(
            summary,
            " - Access Token TTL: {}s",
            self.issuer.access_token_ttl.num_seconds()
        );
        let _ = writeln!(
            summary,
            " - Assertion Leeway: {}s",
            self.issuer.assertion_leeway
        );
        let _ = writeln!(
            summary,
            " - Signing Key: {} ({})",
            self.signing_key_id,
            self.signing_key_path
                .as_ref()
                .map_or_else(|| "generated".to_owned(), |p| p.display().to_string())
        );
        let _ = write!(
            summary,
            " - Store Seed: {}",
            self.store_seed_path
                .as_ref()
                .map_or_else(|| "empty".to_owned(), |p| p.display().to_string())
        );
        summary
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
