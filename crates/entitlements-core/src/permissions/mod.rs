// ABOUTME: Permission model pairing an action with a scope pattern
// ABOUTME: Hosts scope matching, self-scope translation, and entitlement computation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Permissions
//!
//! A [`Permission`] grants an action (`dashboards:read`) over a scope pattern
//! (`dashboards:uid:1`, `dashboards:*`, `users:self`). The submodules implement
//! the three pure steps of entitlement computation:
//!
//! - [`scope`]: pattern containment
//! - [`self_scope`]: rewriting `*:self` templates for a concrete subject
//! - [`entitlements`]: intersecting a delegation set with held permissions

/// Action to scope-list map embedded in access tokens
pub mod entitlements;
/// Scope pattern containment
pub mod scope;
/// Self-referencing scope templates
pub mod self_scope;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use entitlements::{compute_entitlements, Entitlements};
pub use scope::contains;
pub use self_scope::translate_self_scopes;

/// Action granted over a scope pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Action name, e.g. `dashboards:read`
    pub action: String,
    /// Scope pattern, e.g. `dashboards:uid:1`
    pub scope: String,
}

impl Permission {
    /// Create a permission
    pub fn new(action: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            scope: scope.into(),
        }
    }
}

/// Group permissions by action, keeping first-seen scope order and dropping duplicates
#[must_use]
pub fn group_by_action(permissions: &[Permission]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for permission in permissions {
        let scopes = grouped.entry(permission.action.clone()).or_default();
        if !scopes.contains(&permission.scope) {
            scopes.push(permission.scope.clone());
        }
    }
    grouped
}
