//! Search ranking helpers.
//!
//! Product search runs per entity kind (items, categories, offers). Each kind
//! is fetched in two tiers: exact full-string matches first, then
//! case-insensitive partial matches that exclude the exact hits. Exact hits
//! always precede partial hits; popularity ordering only applies within a
//! tier. Kinds are ranked independently and returned side by side.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Default number of results per kind.
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// Maximum number of results per kind.
pub const MAX_SEARCH_LIMIT: i64 = 50;

/// Fixed result cap for categories, regardless of the caller's limit.
pub const CATEGORY_RESULT_CAP: i64 = 5;

/// Trim the raw query and reject empty input.
pub fn normalize_query(raw: Option<&str>) -> Result<String, CoreError> {
    let query = raw.map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(CoreError::Validation("Search query is required".to_string()));
    }
    Ok(query.to_string())
}

/// Build the partial-match pattern for a query.
///
/// The query is escaped so it matches literally; callers apply it
/// case-insensitively (PostgreSQL `~*`).
pub fn partial_pattern(query: &str) -> String {
    regex::escape(query)
}

/// Clamp a user-provided limit to `[1, MAX_SEARCH_LIMIT]`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT)
}

/// How many partial matches may still be fetched after `exact_count` exact
/// matches. Zero means the partial tier is skipped.
pub fn partial_budget(limit: i64, exact_count: usize) -> i64 {
    (limit - exact_count as i64).max(0)
}

/// Merge the two tiers of one entity kind.
///
/// Exact hits come first in their given order, followed by partial hits not
/// already present, truncated to `limit`.
pub fn merge_tiers<T>(exact: Vec<T>, partial: Vec<T>, limit: i64, id_of: impl Fn(&T) -> DbId) -> Vec<T> {
    let limit = usize::try_from(limit.max(0)).unwrap_or(0);
    let seen: HashSet<DbId> = exact.iter().map(&id_of).collect();

    exact
        .into_iter()
        .chain(partial.into_iter().filter(|hit| !seen.contains(&id_of(hit))))
        .take(limit)
        .collect()
}

/// Search response: one ranked list per kind plus the overall count.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults<I, C, O> {
    pub items: Vec<I>,
    pub categories: Vec<C>,
    pub offers: Vec<O>,
    pub total_results: usize,
}

impl<I, C, O> SearchResults<I, C, O> {
    pub fn new(items: Vec<I>, categories: Vec<C>, offers: Vec<O>) -> Self {
        let total_results = items.len() + categories.len() + offers.len();
        Self {
            items,
            categories,
            offers,
            total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Hit {
        id: DbId,
        name: &'static str,
        sell_count: i64,
    }

    fn hit(id: DbId, name: &'static str, sell_count: i64) -> Hit {
        Hit { id, name, sell_count }
    }

    #[test]
    fn blank_query_rejected() {
        assert!(normalize_query(None).is_err());
        assert!(normalize_query(Some("   ")).is_err());
        assert_eq!(normalize_query(Some("  Pizza ")).unwrap(), "Pizza");
    }

    #[test]
    fn pattern_matches_literally_and_case_insensitively() {
        let pattern = partial_pattern("c++ (large)");
        let re = regex::RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .unwrap();
        assert!(re.is_match("Extra C++ (Large) combo"));
        assert!(!re.is_match("c (large)"));
    }

    #[test]
    fn budget_never_negative() {
        assert_eq!(partial_budget(10, 3), 7);
        assert_eq!(partial_budget(3, 5), 0);
        assert_eq!(partial_budget(3, 3), 0);
    }

    #[test]
    fn limit_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_SEARCH_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn exact_match_precedes_more_popular_partial() {
        let exact = vec![hit(1, "Pizza", 2)];
        let partial = vec![hit(2, "Veggie Pizza", 900)];
        let merged = merge_tiers(exact, partial, 10, |h| h.id);
        assert_eq!(merged.iter().map(|h| h.name).collect::<Vec<_>>(), ["Pizza", "Veggie Pizza"]);
        assert!(merged[1].sell_count > merged[0].sell_count);
    }

    #[test]
    fn exact_overflow_leaves_no_room_for_partial() {
        let exact: Vec<Hit> = (1..=5).map(|id| hit(id, "Pizza", 0)).collect();
        let partial = vec![hit(10, "Veggie Pizza", 0)];
        let merged = merge_tiers(exact, partial, 3, |h| h.id);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|h| h.name == "Pizza"));
    }

    #[test]
    fn partial_duplicates_of_exact_are_dropped() {
        let exact = vec![hit(1, "Pizza", 0)];
        let partial = vec![hit(1, "Pizza", 0), hit(2, "Pizza Bianca", 0)];
        let merged = merge_tiers(exact, partial, 10, |h| h.id);
        assert_eq!(merged.iter().map(|h| h.id).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn results_count_all_kinds() {
        let results = SearchResults::new(vec![1, 2], vec!["a"], Vec::<u8>::new());
        assert_eq!(results.total_results, 3);
    }
}
