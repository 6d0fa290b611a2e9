//! Relation policy validation.
//!
//! A policy is validated once, when it is constructed or loaded, so the
//! query path can assume a well-formed rule set.

use crate::config::RelationPolicy;
use crate::{RelationError, RelationResult};
use std::collections::HashSet;

/// Validates a relation policy before use.
///
/// Applies two guardrails:
/// - the rule set must not be empty (an empty override file is almost
///   certainly a mistake, and would silently blank every related panel)
/// - each `(anchor, related)` pair may appear at most once, since the
///   aggregator keys its output by related kind
///
/// # Errors
///
/// Returns a `RelationError::InvalidInput` naming the offending rule.
pub fn validate_policy(policy: &RelationPolicy) -> RelationResult<()> {
    if policy.rules().is_empty() {
        return Err(RelationError::InvalidInput(
            "relation policy contains no rules".into(),
        ));
    }

    let mut seen = HashSet::new();
    for rule in policy.rules() {
        if !seen.insert((rule.anchor, rule.related)) {
            return Err(RelationError::InvalidInput(format!(
                "duplicate relation rule for {} -> {}",
                rule.anchor, rule.related
            )));
        }
    }

    Ok(())
}
