// ABOUTME: Grant handlers resolving subject, audiences, and claims per grant type
// ABOUTME: Client-credentials acts as the service account; JWT-bearer impersonates a user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::assertion::AssertionVerifier;
use super::claims::ClaimsSource;
use super::errors::GrantError;
use super::typestate::{ClaimsPopulated, GrantValidated, TokenFlow};
use crate::models::Subject;
use crate::permissions::{compute_entitlements, translate_self_scopes};
use crate::stores::{PermissionQuery, Stores};

/// Runs the grant-specific part of a token request
#[derive(Clone)]
pub struct GrantHandlers {
    stores: Stores,
    assertions: AssertionVerifier,
}

impl GrantHandlers {
    /// Create handlers reading from `stores`
    #[must_use]
    pub const fn new(stores: Stores, assertions: AssertionVerifier) -> Self {
        Self { stores, assertions }
    }

    /// Issue as the client's own service account
    ///
    /// The client's self permissions act as both the delegation and the held
    /// set. No store is consulted.
    #[must_use]
    pub fn client_credentials(
        flow: TokenFlow<GrantValidated>,
    ) -> TokenFlow<ClaimsPopulated> {
        let identity = flow.client().service_account.clone();
        let entitlements = flow.scopes().wants_entitlements().then(|| {
            let permissions = &flow.client().self_permissions;
            compute_entitlements(permissions, permissions, flow.scopes().as_slice())
        });

        flow.resolve_subject(Subject::for_user(identity.user_id), Vec::new())
            .populate_claims(ClaimsSource::service_account(&identity, entitlements))
    }

    /// Issue on behalf of the user named by a verified assertion
    ///
    /// # Errors
    ///
    /// Returns `InvalidAssertion` for a missing or unverifiable assertion,
    /// `InvalidSubject` for a malformed `sub`, `ImpersonationNotAllowed` when the
    /// client has no impersonation permissions, `SubjectNotFound` for an unknown
    /// user, and `StoreUnavailable` if a store fails
    pub async fn jwt_bearer(
        &self,
        flow: TokenFlow<GrantValidated>,
        assertion: Option<&str>,
    ) -> Result<TokenFlow<ClaimsPopulated>, GrantError> {
        let assertion = assertion
            .filter(|a| !a.is_empty())
            .ok_or_else(|| GrantError::InvalidAssertion("missing assertion".to_owned()))?;
        let client_id = flow.client().client_id.clone();

        let verified = self.assertions.verify(&client_id, assertion).await?;
        let subject: Subject = verified.subject.parse()?;

        if flow.client().impersonate_permissions.is_empty() {
            tracing::warn!(client_id = %client_id, "Client has no impersonation permissions");
            return Err(GrantError::ImpersonationNotAllowed);
        }

        let user_id = subject.user_id();
        let scopes = flow.scopes();
        let (user, teams, roles) = tokio::try_join!(
            self.stores.users.get_user_by_id(user_id),
            async {
                if scopes.wants_teams() {
                    self.stores.teams.get_teams_by_user(user_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if scopes.wants_entitlements() {
                    self.stores.permissions.get_user_roles(user_id).await
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        let Some(user) = user else {
            tracing::warn!(client_id = %client_id, subject = %subject, "Impersonated user not found");
            return Err(GrantError::SubjectNotFound);
        };

        let entitlements = if scopes.wants_entitlements() {
            let team_ids: Vec<i64> = teams.iter().map(|team| team.id).collect();
            let held = self
                .stores
                .permissions
                .get_user_permissions(&PermissionQuery {
                    user_id,
                    roles,
                    team_ids: team_ids.clone(),
                })
                .await?;
            let delegated =
                translate_self_scopes(&flow.client().impersonate_permissions, user_id, &team_ids);
            Some(compute_entitlements(&delegated, &held, scopes.as_slice()))
        } else {
            None
        };

        tracing::debug!(
            client_id = %client_id,
            subject = %subject,
            teams = teams.len(),
            "Impersonated user resolved"
        );

        let source = ClaimsSource::user(&user, &teams, entitlements);
        Ok(flow
            .resolve_subject(subject, verified.audiences)
            .populate_claims(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, ServiceIdentity};
    use crate::oauth2_server::claims::RequestedScopes;
    use crate::oauth2_server::models::GrantType;
    use crate::permissions::Permission;
    use crate::stores::InMemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn client(self_permissions: Vec<Permission>) -> Client {
        Client {
            client_id: "my-client".to_owned(),
            client_secret_hash: String::new(),
            grant_types: vec!["client_credentials".to_owned()],
            service_account: ServiceIdentity {
                user_id: 2,
                name: "Test App".to_owned(),
                login: "testapp".to_owned(),
            },
            self_permissions,
            impersonate_permissions: Vec::new(),
            audiences: vec!["https://oauth.test/".to_owned()],
        }
    }

    fn validated(client: Client, scope: &str) -> TokenFlow<GrantValidated> {
        TokenFlow::dispatch(
            client,
            GrantType::ClientCredentials,
            RequestedScopes::parse(Some(scope)),
        )
        .validate_grant()
        .unwrap()
    }

    #[test]
    fn test_client_credentials_entitlements() {
        let client = client(vec![
            Permission::new("dashboards:read", "dashboards:*"),
            Permission::new("dashboards:read", "folders:*"),
            Permission::new("dashboards:write", "dashboards:uid:1"),
        ]);
        let flow = GrantHandlers::client_credentials(validated(client, "entitlements"));
        assert_eq!(
            flow.extra_claims().get("entitlements"),
            Some(&json!({
                "dashboards:read": ["dashboards:*", "folders:*"],
                "dashboards:write": ["dashboards:uid:1"],
            }))
        );
    }

    #[test]
    fn test_client_credentials_without_entitlements_scope() {
        let client = client(vec![Permission::new("dashboards:read", "dashboards:*")]);
        let flow = GrantHandlers::client_credentials(validated(client, "profile"));
        assert!(flow.extra_claims().get("entitlements").is_none());
        assert_eq!(flow.audiences(), ["https://oauth.test/"]);
    }

    #[tokio::test]
    async fn test_jwt_bearer_requires_assertion() {
        let store = Arc::new(InMemoryStore::new());
        let handlers = GrantHandlers::new(
            Stores::from_shared(store.clone()),
            AssertionVerifier::new(store, "test/oauth2/token", 60),
        );
        let result = handlers
            .jwt_bearer(validated(client(Vec::new()), "profile"), None)
            .await;
        assert!(matches!(result, Err(GrantError::InvalidAssertion(_))));
    }
}
