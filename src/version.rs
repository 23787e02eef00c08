//! Client version ordering.
//!
//! Versions are compared per dotted segment, numerically where both
//! segments parse as integers ("1.10" > "1.9"), lexicographically
//! otherwise. Plain string comparison would order "1.10" before "1.9";
//! the strict `semver` grammar would reject two-segment versions that
//! real clients send, so neither is used here.

use std::cmp::Ordering;

pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = a.trim().split('.');
    let mut right = b.trim().split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            // A missing segment counts as zero: "1.0" == "1.0.0"
            (Some(l), None) => {
                if !segment_is_zero(l) {
                    return Ordering::Greater;
                }
            }
            (None, Some(r)) => {
                if !segment_is_zero(r) {
                    return Ordering::Less;
                }
            }
            (Some(l), Some(r)) => {
                let ord = compare_segment(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// True when `current` is older than `target`.
pub fn is_older(current: &str, target: &str) -> bool {
    compare(current, target) == Ordering::Less
}

fn compare_segment(l: &str, r: &str) -> Ordering {
    match (l.parse::<u64>(), r.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => l.cmp(r),
    }
}

fn segment_is_zero(s: &str) -> bool {
    s.parse::<u64>() == Ok(0)
}
