// ABOUTME: In-memory implementation of every collaborator store
// ABOUTME: Loaded from a JSON seed file or assembled with builder methods in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ClientRegistry, KeyStore, PermissionQuery, PermissionStore, TeamStore, UserStore};
use crate::errors::{AppError, AppResult};
use crate::models::{Client, Team, User};
use crate::permissions::Permission;

/// Client entry of a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSeed {
    /// Registered client
    #[serde(flatten)]
    pub client: Client,
    /// PEM public key for JWT-bearer assertions
    #[serde(default)]
    pub public_key_pem: Option<String>,
}

/// User entry of a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    /// User record
    #[serde(flatten)]
    pub user: User,
    /// Basic roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Team memberships
    #[serde(default)]
    pub team_ids: Vec<i64>,
    /// Directly granted permissions
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Team entry of a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeed {
    /// Team record
    #[serde(flatten)]
    pub team: Team,
    /// Permissions inherited by members
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Role entry of a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSeed {
    /// Role name, e.g. `Viewer`
    pub name: String,
    /// Permissions granted by the role
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// JSON document describing the initial store contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    /// Registered clients
    #[serde(default)]
    pub clients: Vec<ClientSeed>,
    /// Users
    #[serde(default)]
    pub users: Vec<UserSeed>,
    /// Teams
    #[serde(default)]
    pub teams: Vec<TeamSeed>,
    /// Roles
    #[serde(default)]
    pub roles: Vec<RoleSeed>,
}

/// Store backed by hash maps, immutable once built
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    clients: HashMap<String, Client>,
    client_keys: HashMap<String, String>,
    users: HashMap<i64, User>,
    user_roles: HashMap<i64, Vec<String>>,
    user_teams: HashMap<i64, Vec<i64>>,
    user_permissions: HashMap<i64, Vec<Permission>>,
    teams: HashMap<i64, Team>,
    team_permissions: HashMap<i64, Vec<Permission>>,
    role_permissions: HashMap<String, Vec<Permission>>,
}

impl InMemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed seed document
    #[must_use]
    pub fn from_seed(seed: StoreSeed) -> Self {
        let mut store = Self::new();
        for entry in seed.clients {
            store = store.with_client(entry.client.clone());
            if let Some(pem) = entry.public_key_pem {
                store = store.with_client_key(&entry.client.client_id, pem);
            }
        }
        for entry in seed.teams {
            store = store.with_team(entry.team.clone());
            store
                .team_permissions
                .insert(entry.team.id, entry.permissions);
        }
        for entry in seed.roles {
            store = store.with_role(entry.name, entry.permissions);
        }
        for entry in seed.users {
            let user_id = entry.user.id;
            store = store.with_user(entry.user);
            store.user_roles.insert(user_id, entry.roles);
            store.user_teams.insert(user_id, entry.team_ids);
            store.user_permissions.insert(user_id, entry.permissions);
        }
        store
    }

    /// Load a seed document from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid seed document
    pub async fn from_json_file(path: &Path) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::config(format!("Failed to read store seed {}", path.display()))
                .with_source(e)
        })?;
        let seed: StoreSeed = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            clients = seed.clients.len(),
            users = seed.users.len(),
            teams = seed.teams.len(),
            roles = seed.roles.len(),
            "Loaded store seed"
        );
        Ok(Self::from_seed(seed))
    }

    /// Register a client
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.insert(client.client_id.clone(), client);
        self
    }

    /// Register the PEM public key a client signs assertions with
    #[must_use]
    pub fn with_client_key(mut self, client_id: &str, public_key_pem: impl Into<String>) -> Self {
        self.client_keys
            .insert(client_id.to_owned(), public_key_pem.into());
        self
    }

    /// Add a user
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id, user);
        self
    }

    /// Add a team
    #[must_use]
    pub fn with_team(mut self, team: Team) -> Self {
        self.teams.insert(team.id, team);
        self
    }

    /// Make a user a member of a team
    #[must_use]
    pub fn with_team_member(mut self, team_id: i64, user_id: i64) -> Self {
        let memberships = self.user_teams.entry(user_id).or_default();
        if !memberships.contains(&team_id) {
            memberships.push(team_id);
        }
        self
    }

    /// Define the permissions a basic role grants
    #[must_use]
    pub fn with_role(mut self, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        self.role_permissions.insert(name.into(), permissions);
        self
    }

    /// Assign a basic role to a user
    #[must_use]
    pub fn with_user_role(mut self, user_id: i64, role: impl Into<String>) -> Self {
        self.user_roles.entry(user_id).or_default().push(role.into());
        self
    }

    /// Grant permissions directly to a user
    #[must_use]
    pub fn with_user_permissions(mut self, user_id: i64, permissions: Vec<Permission>) -> Self {
        self.user_permissions
            .entry(user_id)
            .or_default()
            .extend(permissions);
        self
    }

    /// Grant permissions to every member of a team
    #[must_use]
    pub fn with_team_permissions(mut self, team_id: i64, permissions: Vec<Permission>) -> Self {
        self.team_permissions
            .entry(team_id)
            .or_default()
            .extend(permissions);
        self
    }
}

#[async_trait]
impl ClientRegistry for InMemoryStore {
    async fn get_client(&self, client_id: &str) -> AppResult<Option<Client>> {
        Ok(self.clients.get(client_id).cloned())
    }
}

#[async_trait]
impl KeyStore for InMemoryStore {
    async fn get_client_public_key(&self, client_id: &str) -> AppResult<Option<String>> {
        Ok(self.client_keys.get(client_id).cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        Ok(self.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl TeamStore for InMemoryStore {
    async fn get_teams_by_user(&self, user_id: i64) -> AppResult<Vec<Team>> {
        let Some(team_ids) = self.user_teams.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(team_ids
            .iter()
            .filter_map(|id| self.teams.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn get_user_permissions(&self, query: &PermissionQuery) -> AppResult<Vec<Permission>> {
        let direct = self.user_permissions.get(&query.user_id).into_iter().flatten();
        let from_roles = query
            .roles
            .iter()
            .filter_map(|role| self.role_permissions.get(role))
            .flatten();
        let from_teams = query
            .team_ids
            .iter()
            .filter_map(|team_id| self.team_permissions.get(team_id))
            .flatten();

        let mut permissions: Vec<Permission> = Vec::new();
        for permission in direct.chain(from_roles).chain(from_teams) {
            if !permissions.contains(permission) {
                permissions.push(permission.clone());
            }
        }
        debug!(
            user_id = query.user_id,
            roles = ?query.roles,
            team_ids = ?query.team_ids,
            count = permissions.len(),
            "Resolved user permissions"
        );
        Ok(permissions)
    }

    async fn get_user_roles(&self, user_id: i64) -> AppResult<Vec<String>> {
        Ok(self.user_roles.get(&user_id).cloned().unwrap_or_default())
    }
}
