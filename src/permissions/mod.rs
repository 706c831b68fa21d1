// ABOUTME: Permission model re-exported from entitlements-core
// ABOUTME: Scope containment, self-scope translation, and entitlement computation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

pub use entitlements_core::permissions::{
    compute_entitlements, contains, group_by_action, translate_self_scopes, Entitlements,
    Permission,
};
