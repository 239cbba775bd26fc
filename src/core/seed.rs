//! Deterministic seeds and PRNG
//!
//! `stable_hash` is pinned (see `HASH_ALGORITHM`): 31-multiplier rolling hash
//! over UTF-16 code units with 32-bit signed wraparound, absolute value at the
//! end. Every port must reproduce it bit for bit.

use crate::types::SeedPackage;
use crate::{LCG_INCREMENT, LCG_MULTIPLIER};

/// Stable, allocation-free string hash. Result is in [0, 2^31].
pub fn stable_hash(text: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        // (hash << 5) - hash + unit, wrapping at 32 bits
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

/// `seed(base, tag) = hash(base + ":" + tag)`
pub fn derive_seed(base: &str, tag: &str) -> SeedPackage {
    let mut hash: i32 = 0;
    for unit in base
        .encode_utf16()
        .chain(":".encode_utf16())
        .chain(tag.encode_utf16())
    {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    SeedPackage::new(hash.unsigned_abs())
}

/// Seed package for a whole text (the content seed)
pub fn content_seed(text: &str) -> SeedPackage {
    SeedPackage::new(stable_hash(text))
}

/// Linear congruential generator, modulus 2^32
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed from a seed string (hashes the key)
    pub fn from_key(key: &str) -> Self {
        Self::new(stable_hash(key))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Uniform in [0, 1); exact for every u32 so identical on all platforms
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Uniform integer in [0, bound); `bound` of 0 yields 0
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        ((self.next_u32() as u64 * bound as u64) >> 32) as u32
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Iterator for Lcg {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        Some(self.next_u32())
    }
}

// =============================================================================
// TESTS
// =============================================================================
