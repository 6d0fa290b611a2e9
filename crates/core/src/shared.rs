//! Shared utilities for the clinrel core.

use std::collections::HashSet;
use std::hash::Hash;

/// Removes duplicates by a derived key, keeping the first occurrence and
/// preserving order.
///
/// Records fetched from several institutions can repeat by id; every call
/// site that needs id-level dedup goes through here instead of hand-rolling
/// its own filter.
pub fn unique_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
