//! Tolerance-aware ordering helpers.
//!
//! Comparisons that treat near-equal values as ties are not transitive, so they
//! must not be handed to `slice::sort_by`. [`rank_with_tolerance`] orders with a
//! plain insertion sort instead, which is stable and deterministic for any
//! comparator.

use std::cmp::Ordering;

/// Compares two values, treating differences up to `eps` as equal.
pub fn compare_with_epsilon(a: f64, b: f64, eps: f64) -> Ordering {
    if (a - b).abs() <= eps {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Stable insertion sort driven by `compare`.
///
/// An element only moves ahead of its predecessor when `compare` ranks the
/// predecessor strictly after it.
pub fn rank_with_tolerance<T>(items: &mut [T], compare: impl Fn(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
