//! Text normalization, shingling and per-shingle hashing.

use std::collections::HashMap;

/// Width, in characters, of the overlapping shingles used as features.
pub const SHINGLE_WIDTH: usize = 4;

/// Normalize text before shingling.
///
/// Lowercases, drops punctuation (anything neither alphanumeric nor
/// whitespace), collapses whitespace runs to a single space and trims.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if !c.is_alphanumeric() {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Count overlapping character shingles of `width` chars.
///
/// Text of `width` chars or fewer yields itself as the only shingle; empty
/// text yields nothing.
pub fn shingles(text: &str, width: usize) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    if text.is_empty() {
        return counts;
    }

    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let chars = bounds.len() - 1;

    if chars <= width {
        counts.insert(text, 1);
        return counts;
    }

    for start in 0..=(chars - width) {
        let shingle = &text[bounds[start]..bounds[start + width]];
        *counts.entry(shingle).or_insert(0) += 1;
    }

    counts
}

/// 64-bit hash of a shingle.
///
/// A 31-multiplier polynomial over the chars, finalized with SplitMix64 so
/// the high bits are as well distributed as the low ones.
pub fn shingle_hash(shingle: &str) -> u64 {
    let raw = shingle
        .chars()
        .fold(0u64, |h, c| h.wrapping_mul(31).wrapping_add(c as u64));
    mix64(raw)
}

fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
