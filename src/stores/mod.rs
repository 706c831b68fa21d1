// ABOUTME: Collaborator store interfaces consumed by the token endpoint
// ABOUTME: Clients, client keys, users, teams, and permissions are read-only per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Stores
//!
//! The token endpoint never owns persistent state. Everything it needs is read
//! through these traits, injected as `Arc<dyn Trait>` so tests and deployments can
//! supply their own backends. A store returns `Ok(None)` for a missing record and
//! `Err` only when the backend itself failed.

/// In-memory store seeded from JSON
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

pub use memory::{InMemoryStore, StoreSeed};

use crate::errors::AppResult;
use crate::models::{Client, Team, User};
use crate::permissions::Permission;

/// Registered OAuth 2.0 clients
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Look up a client by its identifier
    async fn get_client(&self, client_id: &str) -> AppResult<Option<Client>>;
}

/// Public keys clients sign JWT-bearer assertions with
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// PEM-encoded RSA public key registered for a client
    async fn get_client_public_key(&self, client_id: &str) -> AppResult<Option<String>>;
}

/// End users that may be impersonated
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by numeric ID
    async fn get_user_by_id(&self, user_id: i64) -> AppResult<Option<User>>;
}

/// Team memberships
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Teams the user belongs to, in a stable order
    async fn get_teams_by_user(&self, user_id: i64) -> AppResult<Vec<Team>>;
}

/// Input of an effective permission lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionQuery {
    /// User whose permissions are resolved
    pub user_id: i64,
    /// Basic roles held by the user
    pub roles: Vec<String>,
    /// Teams whose permissions the user inherits
    pub team_ids: Vec<i64>,
}

/// Permissions and roles held by users
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Effective permissions from direct grants, roles, and team memberships
    async fn get_user_permissions(&self, query: &PermissionQuery) -> AppResult<Vec<Permission>>;

    /// Basic roles assigned to the user
    async fn get_user_roles(&self, user_id: i64) -> AppResult<Vec<String>>;
}

/// All collaborator stores the token endpoint reads from
#[derive(Clone)]
pub struct Stores {
    /// Client registry
    pub clients: Arc<dyn ClientRegistry>,
    /// Client assertion keys
    pub keys: Arc<dyn KeyStore>,
    /// Users
    pub users: Arc<dyn UserStore>,
    /// Team memberships
    pub teams: Arc<dyn TeamStore>,
    /// Permissions and roles
    pub permissions: Arc<dyn PermissionStore>,
}

impl Stores {
    /// Use a single backend for every store
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: ClientRegistry + KeyStore + UserStore + TeamStore + PermissionStore + 'static,
    {
        Self {
            clients: store.clone(),
            keys: store.clone(),
            users: store.clone(),
            teams: store.clone(),
            permissions: store,
        }
    }
}
