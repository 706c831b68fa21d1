// ABOUTME: Segment-wise scope pattern matcher with trailing wildcard support
// ABOUTME: Decides whether one scope pattern covers every resource another one names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::constants::scope_syntax::{SEPARATOR, WILDCARD};

/// Whether every concrete scope matched by `scope` is also matched by `pattern`
///
/// Patterns are `:`-separated segments. A trailing `*` matches any suffix, so
/// `dashboards:*` contains `dashboards:uid:1` and `dashboards:uid:*`, and a bare
/// `*` contains everything. A concrete pattern only contains itself.
#[must_use]
pub fn contains(pattern: &str, scope: &str) -> bool {
    if pattern == scope {
        return true;
    }
    let Some(pattern_prefix) = pattern.strip_suffix(WILDCARD) else {
        return false;
    };
    // a wildcard scope is covered when its own prefix lies under the pattern prefix
    let scope_text = scope.strip_suffix(WILDCARD).unwrap_or(scope);

    let mut pattern_segments = pattern_prefix.split(SEPARATOR);
    let mut scope_segments = scope_text.split(SEPARATOR);
    let Some(partial) = pattern_segments.next_back() else {
        return true;
    };

    for expected in pattern_segments {
        match scope_segments.next() {
            Some(actual) if actual == expected => {}
            _ => return false,
        }
    }
    scope_segments
        .next()
        .is_some_and(|actual| actual.starts_with(partial))
}
