//! Combination space enumeration
//!
//! Produces every combination of 1..=K bands from an ordered catalog: all
//! singletons in catalog order, then all pairs, and so on. Combinations of
//! equal size are enumerated by a lexicographic walk over index positions
//! `i1 < i2 < ... < is`. Output is deterministic for fixed inputs, which is
//! what lets a resumed run recognise the identities it already attempted.

use std::collections::HashSet;

use shared::{Band, Combination};

/// Enumerate all combinations of up to `max_group_size` bands
///
/// An empty catalog or a zero size yields an empty sequence (plus `AUTO`
/// when requested).
pub fn generate(catalog: &[Band], max_group_size: usize, include_auto: bool) -> Vec<Combination> {
    let bands = distinct_in_order(catalog);
    let max_size = max_group_size.min(bands.len());

    let mut combinations = Vec::new();
    for size in 1..=max_size {
        enumerate_size(&bands, size, &mut combinations);
    }

    if include_auto {
        combinations.push(Combination::auto());
    }

    combinations
}

fn distinct_in_order(catalog: &[Band]) -> Vec<Band> {
    let mut seen = HashSet::new();
    catalog.iter().copied().filter(|band| seen.insert(*band)).collect()
}

fn enumerate_size(bands: &[Band], size: usize, out: &mut Vec<Combination>) {
    let n = bands.len();
    let mut indices: Vec<usize> = (0..size).collect();

    loop {
        let members = indices.iter().map(|&i| bands[i]);
        // bands are distinct and size >= 1, so construction cannot fail
        if let Ok(combination) = Combination::new(members) {
            out.push(combination);
        }

        // Advance the rightmost index that still has room
        let Some(pos) = (0..size).rev().find(|&pos| indices[pos] < n - size + pos) else {
            return;
        };
        indices[pos] += 1;
        for next in pos + 1..size {
            indices[next] = indices[next - 1] + 1;
        }
    }
}
