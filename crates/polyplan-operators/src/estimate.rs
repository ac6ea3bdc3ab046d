//! Heuristic cardinality rules.
//!
//! Without statistics these are educated guesses, so estimators built from
//! them carry a correctness probability below 1.

use serde::{Deserialize, Serialize};

/// Certainty attached to heuristic (non-exact) estimators.
pub const HEURISTIC_CERTAINTY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

/// Fraction of elements expected to pass a predicate, guessed from its text.
pub fn filter_selectivity(predicate: &str) -> f64 {
    if predicate.contains("IS NOT NULL") {
        0.95
    } else if predicate.contains("IS NULL") {
        0.05
    } else if predicate.contains("!=") {
        0.9
    } else if predicate.contains('=') && !predicate.contains(">=") && !predicate.contains("<=") {
        0.1
    } else if predicate.contains('>') || predicate.contains('<') {
        0.33
    } else {
        0.5
    }
}

pub fn filtered(rows: u64, selectivity: f64) -> u64 {
    ((rows as f64 * selectivity) as u64).max(1).min(rows)
}

pub fn join_cardinality(left: u64, right: u64, join_type: JoinType) -> u64 {
    match join_type {
        JoinType::Inner => {
            // Geometric mean, bounded by the smaller side.
            let mean = (left as f64 * right as f64).sqrt();
            (mean as u64).max(1).min(left.min(right))
        }
        JoinType::Left => (left as f64 * 1.2) as u64,
        JoinType::Right => (right as f64 * 1.2) as u64,
        JoinType::Full => (left.max(right) as f64 * 1.5) as u64,
    }
}

/// Number of groups produced by grouping `rows` elements on `num_keys` keys.
pub fn group_count(rows: u64, num_keys: usize) -> u64 {
    if num_keys == 0 {
        return rows.min(1);
    }
    let factor = match num_keys {
        1 => 0.1,
        2 => 0.25,
        3 => 0.4,
        _ => 0.5,
    };
    ((rows as f64 * factor) as u64).max(1).min(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectivity_by_predicate_shape() {
        assert_eq!(filter_selectivity("a = 1"), 0.1);
        assert_eq!(filter_selectivity("a != 1"), 0.9);
        assert_eq!(filter_selectivity("a >= 1"), 0.33);
        assert_eq!(filter_selectivity("a IS NULL"), 0.05);
        assert_eq!(filter_selectivity("a IS NOT NULL"), 0.95);
        assert_eq!(filter_selectivity("udf(a)"), 0.5);
    }

    #[test]
    fn filtering_never_grows_or_invents_rows() {
        assert_eq!(filtered(0, 0.5), 0);
        assert_eq!(filtered(3, 0.1), 1);
        assert_eq!(filtered(1000, 0.33), 330);
    }

    #[test]
    fn inner_join_is_bounded_by_smaller_side() {
        assert_eq!(join_cardinality(100, 100, JoinType::Inner), 100);
        assert_eq!(join_cardinality(10_000, 4, JoinType::Inner), 4);
        assert_eq!(join_cardinality(0, 50, JoinType::Inner), 0);
        assert_eq!(join_cardinality(100, 7, JoinType::Left), 120);
        assert_eq!(join_cardinality(10, 20, JoinType::Full), 30);
    }

    #[test]
    fn groups_shrink_with_fewer_keys() {
        assert_eq!(group_count(1000, 1), 100);
        assert_eq!(group_count(1000, 2), 250);
        assert_eq!(group_count(1000, 0), 1);
        assert_eq!(group_count(0, 0), 0);
        assert_eq!(group_count(0, 2), 0);
    }
}
