// ABOUTME: Token issuer settings shared by signing and assertion verification
// ABOUTME: Issuer URL, access token lifetime, and assertion clock leeway
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::env;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::constants::{defaults, routes};

/// Settings the token issuer needs for every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIssuerConfig {
    /// `iss` claim; also the base of the token endpoint URL assertions must target
    pub issuer: String,
    /// Lifetime of issued access tokens
    pub access_token_ttl: Duration,
    /// Clock skew tolerated when checking assertion expiry, in seconds
    pub assertion_leeway: u64,
}

impl Default for TokenIssuerConfig {
    fn default() -> Self {
        Self::for_issuer(format!("http://localhost:{}", defaults::HTTP_PORT))
    }
}

impl TokenIssuerConfig {
    /// Default lifetimes for the given issuer
    #[must_use]
    pub fn for_issuer(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            access_token_ttl: Duration::seconds(defaults::ACCESS_TOKEN_TTL_SECS),
            assertion_leeway: defaults::ASSERTION_LEEWAY_SECS,
        }
    }

    /// Load from `OAUTH2_ISSUER_URL`, `ACCESS_TOKEN_TTL_SECS`, and `ASSERTION_LEEWAY_SECS`
    ///
    /// The issuer defaults to `http://localhost:<http_port>`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or the TTL is outside
    /// `1..=MAX_ACCESS_TOKEN_TTL_SECS`
    pub fn from_env(http_port: u16) -> Result<Self> {
        let issuer = env::var("OAUTH2_ISSUER_URL")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|_| format!("http://localhost:{http_port}"));

        let ttl_secs: i64 = match env::var("ACCESS_TOKEN_TTL_SECS") {
            Ok(raw) => raw
                .parse()
                .context("Invalid ACCESS_TOKEN_TTL_SECS value")?,
            Err(_) => defaults::ACCESS_TOKEN_TTL_SECS,
        };
        let access_token_ttl = Duration::try_seconds(ttl_secs)
            .filter(|_| (1..=defaults::MAX_ACCESS_TOKEN_TTL_SECS).contains(&ttl_secs))
            .with_context(|| {
                format!(
                    "ACCESS_TOKEN_TTL_SECS must be between 1 and {}, got {ttl_secs}",
                    defaults::MAX_ACCESS_TOKEN_TTL_SECS
                )
            })?;

        let assertion_leeway = match env::var("ASSERTION_LEEWAY_SECS") {
            Ok(raw) => raw
                .parse()
                .context("Invalid ASSERTION_LEEWAY_SECS value")?,
            Err(_) => defaults::ASSERTION_LEEWAY_SECS,
        };

        Ok(Self {
            issuer,
            access_token_ttl,
            assertion_leeway,
        })
    }

    /// Token endpoint URL JWT-bearer assertions must name in `aud`
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.issuer, routes::TOKEN)
    }
}
