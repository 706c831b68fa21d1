// ABOUTME: Data models for registered clients, users, teams, and token subjects
// ABOUTME: Read-only inputs for a single token request; nothing here is persisted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::tokens::SUBJECT_PREFIX;
use crate::permissions::Permission;

/// Service account a client acts as under the client-credentials grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Numeric user ID of the service account
    pub user_id: i64,
    /// Display name
    pub name: String,
    /// Login handle
    pub login: String,
}

/// Registered OAuth 2.0 client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// OAuth 2.0 client identifier
    pub client_id: String,
    /// Argon2 PHC hash of the client secret
    pub client_secret_hash: String,
    /// Grant types this client may use
    pub grant_types: Vec<String>,
    /// Identity used for client-credentials tokens
    pub service_account: ServiceIdentity,
    /// Permissions the service account holds
    #[serde(default)]
    pub self_permissions: Vec<Permission>,
    /// Permissions the client may exercise on behalf of an impersonated user
    #[serde(default)]
    pub impersonate_permissions: Vec<Permission>,
    /// Audiences stamped on every token this client receives
    #[serde(default)]
    pub audiences: Vec<String>,
}

impl Client {
    /// Whether this client registered the given grant type
    #[must_use]
    pub fn allows_grant(&self, grant_type: &str) -> bool {
        self.grant_types.iter().any(|g| g == grant_type)
    }

    /// Whether the audience is one this client registered
    #[must_use]
    pub fn allows_audience(&self, audience: &str) -> bool {
        self.audiences.iter().any(|a| a == audience)
    }
}

/// End user that may be impersonated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric user ID
    pub id: i64,
    /// Email address
    pub email: String,
    /// Login handle
    pub login: String,
    /// Display name
    pub name: String,
    /// Last profile update
    pub updated_at: DateTime<Utc>,
}

/// Team membership record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Numeric team ID
    pub id: i64,
    /// Team name
    pub name: String,
}

/// Subject string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    /// Missing the `user:id:` prefix
    #[error("subject must start with 'user:id:'")]
    MissingPrefix,
    /// The ID part is not a positive integer
    #[error("subject id '{0}' is not a positive integer")]
    InvalidId(String),
}

/// Token subject in `user:id:<n>` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subject {
    user_id: i64,
}

impl Subject {
    /// Subject for a known user ID
    #[must_use]
    pub const fn for_user(user_id: i64) -> Self {
        Self { user_id }
    }

    /// Numeric user ID
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl FromStr for Subject {
    type Err = SubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .strip_prefix(SUBJECT_PREFIX)
            .ok_or(SubjectError::MissingPrefix)?;
        // Rust's integer parser accepts a leading '+', which is not a valid subject
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SubjectError::InvalidId(id.to_owned()));
        }
        let user_id: i64 = id
            .parse()
            .map_err(|_| SubjectError::InvalidId(id.to_owned()))?;
        if user_id <= 0 {
            return Err(SubjectError::InvalidId(id.to_owned()));
        }
        Ok(Self { user_id })
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SUBJECT_PREFIX}{}", self.user_id)
    }
}
