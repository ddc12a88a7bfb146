//! Common-friend intersection

use std::collections::HashSet;

/// Set intersection of two friend lists
///
/// Output follows the order of `first`. Neither list needs to be sorted
/// and the result does not depend on how `second` is ordered.
pub fn intersect(first: &[String], second: &[String]) -> Vec<String> {
    let lookup: HashSet<&str> = second.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(first.len().min(lookup.len()));

    first
        .iter()
        .filter(|email| lookup.contains(email.as_str()) && seen.insert(email.as_str()))
        .cloned()
        .collect()
}
