// ABOUTME: Builds the scope-dependent extra claims of an access token
// ABOUTME: profile, email, groups, and entitlements keywords select what is emitted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::constants::{claims, scope_keywords};
use crate::models::{ServiceIdentity, Team, User};
use crate::permissions::Entitlements;

/// Extra claims merged into the token next to the standard ones
pub type ExtraClaims = Map<String, Value>;

/// Scopes requested in a token request, in request order without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedScopes(Vec<String>);

impl RequestedScopes {
    /// Parse a space-separated `scope` parameter
    #[must_use]
    pub fn parse(scope: Option<&str>) -> Self {
        let mut seen = HashSet::new();
        let scopes = scope
            .unwrap_or_default()
            .split_whitespace()
            .filter(|scope| seen.insert(*scope))
            .map(str::to_owned)
            .collect();
        Self(scopes)
    }

    /// Whether a keyword or action was requested
    #[must_use]
    pub fn includes(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    /// Whether nothing was requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Requested scopes as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether the `entitlements` claim must be computed
    #[must_use]
    pub fn wants_entitlements(&self) -> bool {
        self.includes(scope_keywords::ENTITLEMENTS)
    }

    /// Whether team memberships must be loaded
    #[must_use]
    pub fn wants_teams(&self) -> bool {
        self.includes(scope_keywords::GROUPS) || self.wants_entitlements()
    }

    /// Space-joined scope for the token response, `None` when nothing was requested
    #[must_use]
    pub fn granted(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.join(" "))
        }
    }
}

/// Identity data the claims are drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsSource {
    /// Display name
    pub name: String,
    /// Login handle
    pub login: String,
    /// Unix seconds of the last profile update, impersonated users only
    pub updated_at: Option<i64>,
    /// Email address, impersonated users only
    pub email: Option<String>,
    /// Team names
    pub groups: Vec<String>,
    /// Computed entitlements, present only when requested
    pub entitlements: Option<Entitlements>,
}

impl ClaimsSource {
    /// Source for a client acting as its service account
    #[must_use]
    pub fn service_account(identity: &ServiceIdentity, entitlements: Option<Entitlements>) -> Self {
        Self {
            name: identity.name.clone(),
            login: identity.login.clone(),
            updated_at: None,
            email: None,
            groups: Vec::new(),
            entitlements,
        }
    }

    /// Source for an impersonated user
    #[must_use]
    pub fn user(user: &User, teams: &[Team], entitlements: Option<Entitlements>) -> Self {
        Self {
            name: user.name.clone(),
            login: user.login.clone(),
            updated_at: Some(user.updated_at.timestamp()),
            email: Some(user.email.clone()),
            groups: teams.iter().map(|team| team.name.clone()).collect(),
            entitlements,
        }
    }
}

/// Build extra claims for the requested scopes
///
/// Keyword claims with empty values are left out, except `entitlements`, which is
/// always present once requested. Unknown scopes are ignored.
#[must_use]
pub fn build_extra_claims(scopes: &RequestedScopes, source: ClaimsSource) -> ExtraClaims {
    let mut extra = ExtraClaims::new();
    if scopes.is_empty() {
        return extra;
    }

    if scopes.includes(scope_keywords::PROFILE) {
        if !source.name.is_empty() {
            extra.insert(claims::NAME.to_owned(), Value::String(source.name));
        }
        if !source.login.is_empty() {
            extra.insert(claims::LOGIN.to_owned(), Value::String(source.login));
        }
        if let Some(updated_at) = source.updated_at {
            extra.insert(claims::UPDATED_AT.to_owned(), Value::from(updated_at));
        }
    }

    if scopes.includes(scope_keywords::EMAIL) {
        if let Some(email) = source.email.filter(|email| !email.is_empty()) {
            extra.insert(claims::EMAIL.to_owned(), Value::String(email));
        }
    }

    if scopes.includes(scope_keywords::GROUPS) && !source.groups.is_empty() {
        extra.insert(claims::GROUPS.to_owned(), Value::from(source.groups));
    }

    if scopes.wants_entitlements() {
        let entitlements = source.entitlements.unwrap_or_default();
        extra.insert(
            claims::ENTITLEMENTS.to_owned(),
            Value::Object(
                entitlements
                    .into_inner()
                    .into_iter()
                    .map(|(action, scopes)| (action, Value::from(scopes)))
                    .collect(),
            ),
        );
    }

    extra
}
