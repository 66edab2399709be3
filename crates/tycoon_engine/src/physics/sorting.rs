//! Sorting helpers for the per-axis entity arrays
//!
//! Entities move little between ticks, so the arrays are nearly sorted each time they
//! are re-sorted. Insertion sort is linear on such input and stable.

use std::cmp::Ordering;

/// Stable in-place insertion sort
pub fn insertion_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Re-sort a nearly-sorted array, choosing the algorithm by length
///
/// Both algorithms are stable, so equal keys keep their relative order.
pub fn resort_by<T, F>(items: &mut [T], insertion_threshold: usize, compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < insertion_threshold {
        insertion_sort_by(items, compare);
    } else {
        items.sort_by(compare);
    }
}

/// Merge two individually sorted arrays into one sorted array
///
/// Linear in the combined length. On equal keys elements of `existing` come first.
pub fn merge_sorted_by<T, F>(existing: Vec<T>, incoming: Vec<T>, mut compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    let mut left = existing.into_iter().peekable();
    let mut right = incoming.into_iter().peekable();

    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => compare(a, b) == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }

    merged
}

/// Index of the first element that sorts before its predecessor, if any
pub fn first_unsorted_by<T, F>(items: &[T], mut compare: F) -> Option<usize>
where
    F: FnMut(&T, &T) -> Ordering,
{
    items
        .windows(2)
        .position(|pair| compare(&pair[0], &pair[1]) == Ordering::Greater)
        .map(|i| i + 1)
}
