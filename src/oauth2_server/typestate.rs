// ABOUTME: Typestate pattern for a token request with compile-time state transition safety
// ABOUTME: Dispatched -> GrantValidated -> SubjectResolved -> ClaimsPopulated -> Signed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::marker::PhantomData;

use super::claims::{build_extra_claims, ClaimsSource, ExtraClaims, RequestedScopes};
use super::errors::GrantError;
use super::issuer::{TokenGrant, TokenIssuer};
use super::models::{GrantType, TokenResponse};
use crate::models::{Client, Subject};

// ============================================================================
// State Marker Types
// ============================================================================

/// Client authenticated and grant type parsed
/// Valid transitions: -> GrantValidated
#[derive(Debug)]
pub struct Dispatched;

/// Client is registered for the grant type
/// Valid transitions: -> SubjectResolved
#[derive(Debug)]
pub struct GrantValidated;

/// The token subject and audiences are known
/// Valid transitions: -> ClaimsPopulated
#[derive(Debug)]
pub struct SubjectResolved {
    /// Token subject
    pub subject: Subject,
    /// `aud` values in issue order
    pub audiences: Vec<String>,
}

/// Scope-dependent claims are built
/// Valid transitions: -> Signed
#[derive(Debug)]
pub struct ClaimsPopulated {
    /// Token subject
    pub subject: Subject,
    /// `aud` values in issue order
    pub audiences: Vec<String>,
    /// Claims beyond the standard set
    pub extra: ExtraClaims,
    /// Number of actions in the entitlements claim
    pub entitlement_actions: usize,
}

/// Token is signed
#[derive(Debug)]
pub struct Signed {
    /// Token subject
    pub subject: Subject,
    /// Number of actions in the entitlements claim
    pub entitlement_actions: usize,
    /// Response returned to the client
    pub response: TokenResponse,
}

// ============================================================================
// Token Flow with Typestate
// ============================================================================

/// One token request moving through grant handling
///
/// Each transition consumes the flow, so a token cannot be signed before its
/// claims are populated and claims cannot be populated for an unvalidated grant.
///
/// # Example
///
/// ```no_run
/// use oauth2_entitlements::oauth2_server::{
///     ClaimsSource, GrantError, GrantType, RequestedScopes, TokenFlow, TokenIssuer,
///     TokenResponse,
/// };
/// use oauth2_entitlements::models::{Client, Subject};
///
/// fn example(client: Client, issuer: &TokenIssuer) -> Result<TokenResponse, GrantError> {
///     let scopes = RequestedScopes::parse(Some("profile"));
///     let identity = client.service_account.clone();
///     let flow = TokenFlow::dispatch(client, GrantType::ClientCredentials, scopes)
///         .validate_grant()?
///         .resolve_subject(Subject::for_user(identity.user_id), Vec::new())
///         .populate_claims(ClaimsSource::service_account(&identity, None))
///         .sign(issuer)?;
///     Ok(flow.into_response())
/// }
/// ```
#[derive(Debug)]
pub struct TokenFlow<State> {
    /// Authenticated client
    client: Client,
    /// Requested grant
    grant: GrantType,
    /// Requested scopes
    scopes: RequestedScopes,
    /// Current state data
    state: State,
    /// Marker to prevent state from being dropped
    _marker: PhantomData<State>,
}

impl<State> TokenFlow<State> {
    /// Authenticated client
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Requested grant
    #[must_use]
    pub const fn grant(&self) -> GrantType {
        self.grant
    }

    /// Requested scopes
    #[must_use]
    pub const fn scopes(&self) -> &RequestedScopes {
        &self.scopes
    }

    fn advance<Next>(self, state: Next) -> TokenFlow<Next> {
        TokenFlow {
            client: self.client,
            grant: self.grant,
            scopes: self.scopes,
            state,
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Dispatched State Implementation
// ============================================================================

impl TokenFlow<Dispatched> {
    /// Start a flow for an authenticated client
    #[must_use]
    pub fn dispatch(client: Client, grant: GrantType, scopes: RequestedScopes) -> Self {
        Self {
            client,
            grant,
            scopes,
            state: Dispatched,
            _marker: PhantomData,
        }
    }

    /// Check the client is registered for the grant
    ///
    /// # Errors
    ///
    /// Returns `UnauthorizedClient` if the grant is not among the client's grant types
    pub fn validate_grant(self) -> Result<TokenFlow<GrantValidated>, GrantError> {
        if !self.client.allows_grant(self.grant.as_str()) {
            tracing::warn!(
                client_id = %self.client.client_id,
                grant_type = %self.grant,
                "Client not registered for grant type"
            );
            return Err(GrantError::UnauthorizedClient(self.grant.to_string()));
        }
        Ok(self.advance(GrantValidated))
    }
}

// ============================================================================
// GrantValidated State Implementation
// ============================================================================

impl TokenFlow<GrantValidated> {
    /// Fix the token subject
    ///
    /// Audiences are `extra_audiences` followed by the client's registered
    /// audiences, without duplicates.
    #[must_use]
    pub fn resolve_subject(
        self,
        subject: Subject,
        extra_audiences: Vec<String>,
    ) -> TokenFlow<SubjectResolved> {
        let mut audiences: Vec<String> = Vec::with_capacity(extra_audiences.len());
        for audience in extra_audiences
            .into_iter()
            .chain(self.client.audiences.iter().cloned())
        {
            if !audiences.contains(&audience) {
                audiences.push(audience);
            }
        }

        tracing::debug!(
            client_id = %self.client.client_id,
            subject = %subject,
            "Token subject resolved"
        );
        self.advance(SubjectResolved {
            subject,
            audiences,
        })
    }
}

// ============================================================================
// SubjectResolved State Implementation
// ============================================================================

impl TokenFlow<SubjectResolved> {
    /// Token subject
    #[must_use]
    pub const fn subject(&self) -> Subject {
        self.state.subject
    }

    /// Build the scope-dependent claims
    #[must_use]
    pub fn populate_claims(self, source: ClaimsSource) -> TokenFlow<ClaimsPopulated> {
        let entitlement_actions = source.entitlements.as_ref().map_or(0, |e| e.len());
        let extra = build_extra_claims(&self.scopes, source);
        let SubjectResolved {
            subject,
            audiences,
        } = self.state;
        TokenFlow {
            client: self.client,
            grant: self.grant,
            scopes: self.scopes,
            state: ClaimsPopulated {
                subject,
                audiences,
                extra,
                entitlement_actions,
            },
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// ClaimsPopulated State Implementation
// ============================================================================

impl TokenFlow<ClaimsPopulated> {
    /// Claims beyond the standard set
    #[must_use]
    pub const fn extra_claims(&self) -> &ExtraClaims {
        &self.state.extra
    }

    /// `aud` values in issue order
    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.state.audiences
    }

    /// Sign the token
    ///
    /// # Errors
    ///
    /// Returns `SigningFailure` if signing fails
    pub fn sign(self, issuer: &TokenIssuer) -> Result<TokenFlow<Signed>, GrantError> {
        let ClaimsPopulated {
            subject,
            audiences,
            extra,
            entitlement_actions,
        } = self.state;
        let response = issuer.issue(TokenGrant {
            client_id: &self.client.client_id,
            subject,
            audiences,
            extra,
            scope: self.scopes.granted(),
        })?;
        Ok(TokenFlow {
            client: self.client,
            grant: self.grant,
            scopes: self.scopes,
            state: Signed {
                subject,
                entitlement_actions,
                response,
            },
            _marker: PhantomData,
        })
    }
}

// ============================================================================
// Signed State Implementation
// ============================================================================

impl TokenFlow<Signed> {
    /// Token subject
    #[must_use]
    pub const fn subject(&self) -> Subject {
        self.state.subject
    }

    /// Number of actions in the entitlements claim
    #[must_use]
    pub const fn entitlement_actions(&self) -> usize {
        self.state.entitlement_actions
    }

    /// Signed token response
    #[must_use]
    pub fn into_response(self) -> TokenResponse {
        self.state.response
    }
}
