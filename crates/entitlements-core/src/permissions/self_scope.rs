// ABOUTME: Rewrites self-referencing scope templates for an impersonated subject
// ABOUTME: users:self, global.users:self, and teams:self become concrete id scopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Permission;
use crate::constants::self_scopes::{
    GLOBAL_USERS_ID_PREFIX, GLOBAL_USERS_SELF, TEAMS_ID_PREFIX, TEAMS_SELF, USERS_ID_PREFIX,
    USERS_SELF,
};

/// Replace self templates with scopes naming the subject and its teams
///
/// - `global.users:self` becomes `global.users:id:<user_id>`
/// - `users:self` becomes `users:id:<user_id>`
/// - `teams:self` becomes one `teams:id:<team_id>` per team, or nothing without teams
///
/// Every other permission passes through unchanged and in order. The output
/// contains no templates, so translating it again returns it as is.
#[must_use]
pub fn translate_self_scopes(
    permissions: &[Permission],
    user_id: i64,
    team_ids: &[i64],
) -> Vec<Permission> {
    let mut translated = Vec::with_capacity(permissions.len());
    for permission in permissions {
        match permission.scope.as_str() {
            GLOBAL_USERS_SELF => translated.push(Permission::new(
                permission.action.clone(),
                format!("{GLOBAL_USERS_ID_PREFIX}{user_id}"),
            )),
            USERS_SELF => translated.push(Permission::new(
                permission.action.clone(),
                format!("{USERS_ID_PREFIX}{user_id}"),
            )),
            TEAMS_SELF => translated.extend(team_ids.iter().map(|team_id| {
                Permission::new(permission.action.clone(), format!("{TEAMS_ID_PREFIX}{team_id}"))
            })),
            _ => translated.push(permission.clone()),
        }
    }
    translated
}
