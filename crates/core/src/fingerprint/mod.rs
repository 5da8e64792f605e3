//! Locality-sensitive text fingerprints.
//!
//! A [`Fingerprint`] is a 64-bit weighted SimHash over overlapping character
//! shingles of the normalized text. Near-duplicate texts land a small
//! Hamming distance apart; unrelated texts end up around 32 bits apart.
//!
//! On the wire a fingerprint is always 16 lowercase hex digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

pub mod shingle;

use shingle::{SHINGLE_WIDTH, normalize_text, shingle_hash, shingles};

/// Similarity at or above which content counts as unchanged when the caller
/// does not pass a threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

const BITS: u32 = u64::BITS;

/// A 64-bit similarity-preserving digest of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Reserved fingerprint of empty text.
    pub const ZERO: Fingerprint = Fingerprint(0);

    pub const fn from_bits(bits: u64) -> Self {
        Fingerprint(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Number of bit positions that differ.
    pub fn hamming_distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.to_be_bytes()))
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 {
            return Err(Error::InvalidInput(format!("fingerprint must be 16 hex digits, got {s:?}")));
        }
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::InvalidInput(format!("invalid fingerprint {s:?}: {e}")))?;
        Ok(Fingerprint(u64::from_be_bytes(bytes)))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How much content changed between two fingerprints.
///
/// Advisory only; cache decisions use [`is_similar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeLevel {
    None,
    Minor,
    Moderate,
    Major,
}

/// Fingerprint arbitrary text.
///
/// Text that normalizes to nothing maps to [`Fingerprint::ZERO`].
pub fn fingerprint(text: &str) -> Fingerprint {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Fingerprint::ZERO;
    }

    let mut acc = [0i64; BITS as usize];
    for (shingle, count) in shingles(&normalized, SHINGLE_WIDTH) {
        let hash = shingle_hash(shingle);
        let weight = i64::from(count);
        for (bit, slot) in acc.iter_mut().enumerate() {
            if (hash >> bit) & 1 == 1 {
                *slot += weight;
            } else {
                *slot -= weight;
            }
        }
    }

    let bits = acc
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .fold(0u64, |bits, (bit, _)| bits | (1 << bit));

    Fingerprint(bits)
}

/// `1 - hamming(a, b) / 64`, in `[0, 1]`.
pub fn similarity(a: Fingerprint, b: Fingerprint) -> f64 {
    1.0 - f64::from(a.hamming_distance(b)) / f64::from(BITS)
}

/// Whether `similarity(a, b)` reaches `threshold`.
pub fn is_similar(a: Fingerprint, b: Fingerprint, threshold: f64) -> bool {
    similarity(a, b) >= threshold
}

/// Bucket the similarity of two fingerprints.
pub fn classify(a: Fingerprint, b: Fingerprint) -> ChangeLevel {
    match similarity(a, b) {
        s if s >= 0.95 => ChangeLevel::None,
        s if s >= 0.8 => ChangeLevel::Minor,
        s if s >= 0.6 => ChangeLevel::Moderate,
        _ => ChangeLevel::Major,
    }
}

/// Reject thresholds outside `[0, 1]` (NaN included).
pub fn validate_threshold(threshold: f64) -> Result<f64, Error> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(Error::InvalidInput(format!("threshold must be within [0, 1], got {threshold}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "Rust is a multi-paradigm, general-purpose programming language that emphasizes \
        performance, type safety, and concurrency. It enforces memory safety, meaning that all references \
        point to valid memory, without a garbage collector. To simultaneously enforce memory safety and \
        prevent data races, its borrow checker tracks the object lifetime of all references in a program \
        during compilation. Rust was influenced by ideas from functional programming, including \
        immutability, higher-order functions, algebraic data types, and pattern matching. It also supports \
        object-oriented programming via structs, enums, traits, and methods. Software developer Graydon \
        Hoare created Rust as a personal project while working at Mozilla Research in 2006. Mozilla \
        officially sponsored the project in 2009. The first stable release of Rust, Rust 1.0, was \
        published in May 2015.";

    fn with_bits_set(n: u32) -> Fingerprint {
        Fingerprint::from_bits(if n == 64 { u64::MAX } else { (1u64 << n) - 1 })
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint(PAGE), fingerprint(PAGE));
        assert_eq!(similarity(fingerprint(PAGE), fingerprint(PAGE)), 1.0);
    }

    #[test]
    fn test_fingerprint_empty_is_zero() {
        assert_eq!(fingerprint(""), Fingerprint::ZERO);
        assert_eq!(fingerprint("   \n\t "), Fingerprint::ZERO);
        assert_eq!(fingerprint("?!..."), Fingerprint::ZERO);
    }

    #[test]
    fn test_fingerprint_ignores_case_spacing_and_punctuation() {
        let a = fingerprint("Hello world, this is a test page.");
        let b = fingerprint("  HELLO   world this is a TEST page ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_near_duplicate_is_similar() {
        let edited = PAGE.replace("garbage collector", "tracing collector");
        let s = similarity(fingerprint(PAGE), fingerprint(&edited));
        assert!(s >= 0.95, "near-duplicate similarity was {s}");
        assert_eq!(classify(fingerprint(PAGE), fingerprint(&edited)), ChangeLevel::None);
    }

    #[test]
    fn test_unrelated_text_is_dissimilar() {
        let other = "Completely unrelated content about cooking recipes and kitchen tools.";
        let s = similarity(fingerprint(PAGE), fingerprint(other));
        assert!(s < DEFAULT_THRESHOLD, "unrelated similarity was {s}");
    }

    #[test]
    fn test_similarity_symmetric_and_bounded() {
        let samples = ["", "a", "hello world", PAGE, "cooking recipes and kitchen tools"];
        for a in samples {
            for b in samples {
                let (fa, fb) = (fingerprint(a), fingerprint(b));
                let s = similarity(fa, fb);
                assert_eq!(s, similarity(fb, fa));
                assert!((0.0..=1.0).contains(&s));
            }
        }
        assert_eq!(similarity(Fingerprint::ZERO, Fingerprint::from_bits(u64::MAX)), 0.0);
    }

    #[test]
    fn test_is_similar_threshold() {
        let a = Fingerprint::ZERO;
        let b = with_bits_set(12); // 0.8125
        assert!(is_similar(a, b, 0.8));
        assert!(!is_similar(a, b, 0.82));
        assert!(is_similar(a, a, 1.0));
    }

    #[test]
    fn test_classify_cut_points() {
        let zero = Fingerprint::ZERO;
        assert_eq!(classify(zero, zero), ChangeLevel::None);
        assert_eq!(classify(zero, with_bits_set(3)), ChangeLevel::None);
        assert_eq!(classify(zero, with_bits_set(4)), ChangeLevel::Minor);
        assert_eq!(classify(zero, with_bits_set(12)), ChangeLevel::Minor);
        assert_eq!(classify(zero, with_bits_set(13)), ChangeLevel::Moderate);
        assert_eq!(classify(zero, with_bits_set(25)), ChangeLevel::Moderate);
        assert_eq!(classify(zero, with_bits_set(26)), ChangeLevel::Major);
    }

    #[test]
    fn test_hex_format() {
        let fp = Fingerprint::from_bits(0x00ab_cdef_0123_4567);
        assert_eq!(fp.to_string(), "00abcdef01234567");
        assert_eq!(Fingerprint::ZERO.to_string(), "0000000000000000");
        assert_eq!("00ABCDEF01234567".parse::<Fingerprint>().unwrap(), fp);
    }

    #[test]
    fn test_hex_parse_rejects_malformed() {
        assert!(matches!("abc".parse::<Fingerprint>(), Err(Error::InvalidInput(_))));
        assert!(matches!("zzzzzzzzzzzzzzzz".parse::<Fingerprint>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let fp = fingerprint(PAGE);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{fp}\""));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }
}
