//! Seed packages derived from (base, tag)

use serde::{Deserialize, Serialize};

/// Reproducible (string, numeric) seed pair. Same (base, tag) → same package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedPackage {
    /// Display seed and PRNG state key (base-36 of `value`)
    pub key: String,
    /// Raw non-negative hash, at most 2^31
    pub value: u32,
}

impl SeedPackage {
    pub fn new(value: u32) -> Self {
        Self {
            key: to_base36(value),
            value,
        }
    }

    /// Numeric form normalized into [0, 1)
    pub fn unit(&self) -> f64 {
        self.value as f64 / crate::HASH_UNIT_DIVISOR
    }
}

impl std::fmt::Display for SeedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Lower-case base-36 rendering
pub fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(7);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
