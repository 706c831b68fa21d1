// ABOUTME: Intersects a delegation set with a subject's held permissions
// ABOUTME: Produces the action to scope-list map written into the entitlements claim
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{contains, group_by_action, Permission};
use crate::constants::scope_syntax::SEPARATOR;

/// Action to ordered scope list, serialized as a plain JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entitlements(BTreeMap<String, Vec<String>>);

impl Entitlements {
    /// Whether no action survived
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Scopes granted for an action
    #[must_use]
    pub fn get(&self, action: &str) -> Option<&[String]> {
        self.0.get(action).map(Vec::as_slice)
    }

    /// Iterate actions in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Underlying map
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Entitlements {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Vec<String>>> for Entitlements {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// Compute what a token may assert for each action
///
/// `delegated` is what the client may exercise, `held` is what the subject
/// actually has, and `requested_scopes` is the raw scope list from the token
/// request. Requested scopes containing `:` name actions; when any are present
/// only those actions are considered.
///
/// For every pair of held scope and allowed pattern the narrower of the two is
/// kept, so each resulting scope is covered by both the delegation and the
/// subject's own permissions.
#[must_use]
pub fn compute_entitlements(
    delegated: &[Permission],
    held: &[Permission],
    requested_scopes: &[String],
) -> Entitlements {
    let allowed_by_action = group_by_action(delegated);
    let held_by_action = group_by_action(held);

    let requested_actions: BTreeSet<&str> = requested_scopes
        .iter()
        .map(String::as_str)
        .filter(|scope| scope.contains(SEPARATOR))
        .collect();

    let mut result = BTreeMap::new();
    for (action, allowed) in &allowed_by_action {
        if !requested_actions.is_empty() && !requested_actions.contains(action.as_str()) {
            continue;
        }
        let Some(actual_scopes) = held_by_action.get(action) else {
            continue;
        };

        let mut granted: Vec<String> = Vec::new();
        for actual in actual_scopes {
            for pattern in allowed {
                let narrower = if contains(pattern, actual) {
                    actual
                } else if contains(actual, pattern) {
                    pattern
                } else {
                    continue;
                };
                if !granted.contains(narrower) {
                    granted.push(narrower.clone());
                }
            }
        }

        if !granted.is_empty() {
            result.insert(action.clone(), granted);
        }
    }
    Entitlements(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_owned).collect()
    }

    fn self_permissions() -> Vec<Permission> {
        vec![
            Permission::new("dashboards:read", "dashboards:*"),
            Permission::new("dashboards:read", "folders:*"),
            Permission::new("dashboards:write", "dashboards:uid:1"),
        ]
    }

    #[test]
    fn test_self_permissions_grouped_by_action() {
        let perms = self_permissions();
        let entitlements = compute_entitlements(&perms, &perms, &scopes("entitlements"));
        assert_eq!(entitlements.len(), 2);
        assert_eq!(
            entitlements.get("dashboards:read"),
            Some(&["dashboards:*".to_owned(), "folders:*".to_owned()][..])
        );
        assert_eq!(
            entitlements.get("dashboards:write"),
            Some(&["dashboards:uid:1".to_owned()][..])
        );
    }

    #[test]
    fn test_requested_action_filters() {
        let perms = self_permissions();
        let entitlements =
            compute_entitlements(&perms, &perms, &scopes("entitlements dashboards:write"));
        assert_eq!(entitlements.len(), 1);
        assert!(entitlements.get("dashboards:read").is_none());
        assert_eq!(
            entitlements.get("dashboards:write"),
            Some(&["dashboards:uid:1".to_owned()][..])
        );
    }

    #[test]
    fn test_requested_action_not_delegated_yields_empty() {
        let perms = self_permissions();
        let entitlements = compute_entitlements(&perms, &perms, &scopes("users:read"));
        assert!(entitlements.is_empty());
    }

    #[test]
    fn test_narrowed_to_held_scope() {
        let delegated = vec![Permission::new("datasources:read", "datasources:*")];
        let held = vec![Permission::new("datasources:read", "datasources:uid:1")];
        let entitlements = compute_entitlements(&delegated, &held, &scopes("entitlements"));
        assert_eq!(
            entitlements.get("datasources:read"),
            Some(&["datasources:uid:1".to_owned()][..])
        );
    }

    #[test]
    fn test_narrowed_to_delegated_scope() {
        let delegated = vec![
            Permission::new("teams:read", "teams:id:1"),
            Permission::new("teams:read", "teams:id:2"),
        ];
        let held = vec![Permission::new("teams:read", "teams:*")];
        let entitlements = compute_entitlements(&delegated, &held, &scopes("entitlements"));
        assert_eq!(
            entitlements.get("teams:read"),
            Some(&["teams:id:1".to_owned(), "teams:id:2".to_owned()][..])
        );
    }

    #[test]
    fn test_wildcard_narrowed_both_ways() {
        let delegated = vec![Permission::new("users:read", "global.users:*")];
        let held = vec![Permission::new("users:read", "global.users:id:*")];
        let entitlements = compute_entitlements(&delegated, &held, &scopes("users:read"));
        assert_eq!(
            entitlements.get("users:read"),
            Some(&["global.users:id:*".to_owned()][..])
        );
    }

    #[test]
    fn test_unheld_actions_omitted() {
        let delegated = vec![
            Permission::new("dashboards:read", "folders:uid:UID1"),
            Permission::new("datasources:read", "datasources:*"),
        ];
        let held = vec![Permission::new("dashboards:read", "folders:*")];
        let entitlements = compute_entitlements(&delegated, &held, &[]);
        assert_eq!(entitlements.len(), 1);
        assert!(entitlements.get("datasources:read").is_none());
    }

    #[test]
    fn test_disjoint_scopes_dropped() {
        let delegated = vec![Permission::new("dashboards:read", "folders:uid:A")];
        let held = vec![Permission::new("dashboards:read", "folders:uid:B")];
        assert!(compute_entitlements(&delegated, &held, &[]).is_empty());
    }

    #[test]
    fn test_result_covered_by_delegation_and_held() {
        let delegated = vec![
            Permission::new("dashboards:read", "dashboards:*"),
            Permission::new("dashboards:read", "folders:uid:1"),
            Permission::new("users:read", "users:id:*"),
        ];
        let held = vec![
            Permission::new("dashboards:read", "dashboards:uid:9"),
            Permission::new("dashboards:read", "folders:*"),
            Permission::new("users:read", "*"),
        ];
        let entitlements = compute_entitlements(&delegated, &held, &[]);
        assert!(!entitlements.is_empty());
        for (action, granted) in entitlements.iter() {
            for scope in granted {
                assert!(delegated
                    .iter()
                    .any(|p| &p.action == action && contains(&p.scope, scope)));
                assert!(held
                    .iter()
                    .any(|p| &p.action == action && contains(&p.scope, scope)));
            }
        }
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let perms = self_permissions();
        let entitlements = compute_entitlements(&perms, &perms, &scopes("dashboards:write"));
        let json = serde_json::to_value(&entitlements).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "dashboards:write": ["dashboards:uid:1"] })
        );
    }
}
