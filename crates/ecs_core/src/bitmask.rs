//! Variable-length bitset used to key archetypes, filters and lookup buckets.
//!
//! A mask is a little-endian sequence of 32-bit words with no trailing zero
//! word. Every function here treats that trimming as an invariant of its
//! *inputs*, but is still defensive about comparing masks of different
//! lengths: a longer, untrimmed mask compares equal to a shorter one as long
//! as the extra words are all zero.

use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

/// Inline capacity before a mask spills to the heap: 8 words covers 256
/// component ids, the threshold this family of types is specified against.
const INLINE_WORDS: usize = 8;

type Words = SmallVec<[u32; INLINE_WORDS]>;

const WORD_BITS: usize = u32::BITS as usize;

/// A trimmed, owned bitmask.
///
/// Construction always goes through [`Bitmask::from_bits`] or the in-place
/// `set`/`clear` methods, both of which re-trim, so a live `Bitmask` is never
/// observed with a trailing zero word.
#[derive(Clone, Debug, Default)]
pub struct Bitmask(Words);

impl Bitmask {
    /// The empty mask (no bits set).
    pub fn empty() -> Self {
        Self(Words::new())
    }

    /// Builds a trimmed mask with `bit` set for every id in `bits`.
    pub fn from_bits(bits: impl IntoIterator<Item = u32>) -> Self {
        let mut mask = Self::empty();
        for bit in bits {
            mask.set(bit as usize);
        }
        mask
    }

    pub fn words(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets bit `k`, growing the backing words if necessary.
    pub fn set(&mut self, k: usize) {
        let word = k / WORD_BITS;
        if word >= self.0.len() {
            self.0.resize(word + 1, 0);
        }
        self.0[word] |= 1u32 << (k % WORD_BITS);
    }

    /// Clears bit `k`, re-trimming if that removed the last set bit in the
    /// highest word(s).
    pub fn clear(&mut self, k: usize) {
        let word = k / WORD_BITS;
        if word >= self.0.len() {
            return;
        }
        self.0[word] &= !(1u32 << (k % WORD_BITS));
        self.trim();
    }

    fn trim(&mut self) {
        while matches!(self.0.last(), Some(0)) {
            self.0.pop();
        }
    }

    pub fn test(&self, k: usize) -> bool {
        test(&self.0, k)
    }
}

impl PartialEq for Bitmask {
    fn eq(&self, other: &Self) -> bool {
        equals(&self.0, &other.0)
    }
}
impl Eq for Bitmask {}

impl Hash for Bitmask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_words(&self.0, state);
    }
}

/// `true` iff bit `k` is set. Out-of-range bits (beyond the mask's trimmed
/// length) are unset by definition.
pub fn test(mask: &[u32], k: usize) -> bool {
    let word = k / WORD_BITS;
    word < mask.len() && mask[word] & (1u32 << (k % WORD_BITS)) != 0
}

/// Trimmed word-by-word equality, tolerant of trailing-zero length skew.
pub fn equals(a: &[u32], b: &[u32]) -> bool {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    shorter.iter().eq(longer[..shorter.len()].iter()) && longer[shorter.len()..].iter().all(|&w| w == 0)
}

/// Deterministic hash of a trimmed mask: two equal masks (per [`equals`])
/// hash identically regardless of untrimmed trailing zeros.
pub fn hash(mask: &[u32]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hash_words(mask, &mut hasher);
    hasher.finish()
}

fn hash_words<H: Hasher>(mask: &[u32], hasher: &mut H) {
    let end = mask.iter().rposition(|&w| w != 0).map_or(0, |i| i + 1);
    mask[..end].hash(hasher);
}

/// Every bit set in `needle` is set in `haystack`; vacuously true if `needle`
/// is empty.
pub fn requires(needle: &[u32], haystack: &[u32]) -> bool {
    needle
        .iter()
        .enumerate()
        .all(|(i, &word)| word & haystack.get(i).copied().unwrap_or(0) == word)
}

/// `needle` is empty, or overlaps `haystack` in at least one bit.
pub fn includes(needle: &[u32], haystack: &[u32]) -> bool {
    needle.is_empty()
        || needle
            .iter()
            .enumerate()
            .any(|(i, &word)| word & haystack.get(i).copied().unwrap_or(0) != 0)
}

/// `needle` and `haystack` share no set bit.
pub fn excludes(needle: &[u32], haystack: &[u32]) -> bool {
    needle
        .iter()
        .enumerate()
        .all(|(i, &word)| word & haystack.get(i).copied().unwrap_or(0) == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_test_round_trips() {
        let mut mask = Bitmask::empty();
        mask.set(3);
        mask.set(40);
        assert!(mask.test(3));
        assert!(mask.test(40));
        assert!(!mask.test(4));
        assert_eq!(mask.words().len(), 2);
    }

    #[test]
    fn clear_retrims_trailing_zero_words() {
        let mut mask = Bitmask::empty();
        mask.set(40);
        assert_eq!(mask.words().len(), 2);
        mask.clear(40);
        assert!(mask.is_empty());
        assert_eq!(mask.words().len(), 0);
    }

    #[test]
    fn equals_ignores_trailing_zero_length_skew() {
        assert!(equals(&[1, 2], &[1, 2, 0, 0]));
        assert!(!equals(&[1, 2], &[1, 2, 1]));
    }

    #[test]
    fn hash_matches_for_equal_masks_of_different_length() {
        assert_eq!(hash(&[5, 0, 0]), hash(&[5]));
    }

    #[test]
    fn requires_is_vacuous_for_empty_needle() {
        assert!(requires(&[], &[0xFF]));
    }

    #[test]
    fn requires_checks_superset() {
        assert!(requires(&[0b011], &[0b111]));
        assert!(!requires(&[0b011], &[0b010]));
    }

    #[test]
    fn includes_is_vacuous_for_empty_needle_but_checks_overlap_otherwise() {
        assert!(includes(&[], &[]));
        assert!(includes(&[0b001], &[0b101]));
        assert!(!includes(&[0b010], &[0b101]));
    }

    #[test]
    fn excludes_checks_disjointness() {
        assert!(excludes(&[0b010], &[0b101]));
        assert!(!excludes(&[0b001], &[0b101]));
    }
}
