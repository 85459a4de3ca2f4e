//! Canonical key ordering
//!
//! Both canonical profiles order map keys by their encoded bytes only, so the
//! comparison works on slices of the output buffer and never on decoded values.

use crate::map::KeyValueRange;
use cbor_format::{Conformance, MajorType};
use std::cmp::Ordering;

/// Compare two encoded keys under `conformance`.
///
/// Both slices must hold at least one byte.
///
/// # Panics
///
/// Panics when called under [`Conformance::Lax`], which defines no key order.
/// The writer only keeps key-order state for ordering profiles, so reaching
/// this is a bug.
pub fn compare_encoded(left: &[u8], right: &[u8], conformance: Conformance) -> Ordering {
    debug_assert!(!left.is_empty() && !right.is_empty());

    match conformance {
        Conformance::Canonical => compare_length_first(left, right),
        Conformance::Ctap2Canonical => {
            let left_major = MajorType::of_initial_byte(left[0]);
            let right_major = MajorType::of_initial_byte(right[0]);
            left_major
                .cmp(&right_major)
                .then_with(|| compare_length_first(left, right))
        }
        Conformance::Lax => {
            unreachable!("map key comparison requested under lax conformance")
        }
    }
}

/// Compare the keys of two ranges resolved against `buffer`.
pub fn compare_ranges(
    buffer: &[u8],
    left: &KeyValueRange,
    right: &KeyValueRange,
    conformance: Conformance,
) -> Ordering {
    compare_encoded(left.key(buffer), right.key(buffer), conformance)
}

fn compare_length_first(left: &[u8], right: &[u8]) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}
