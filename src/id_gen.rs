//! Identifier generation: random numeric strings, unique within one collection.
//!
//! [`IdGenerator::next_unique`] samples `[0, 1_000_000)` and retries until the caller's
//! `is_taken` check passes. After [`MAX_RANDOM_ATTEMPTS`] misses it walks the space from a
//! random start, so a nearly full collection still gets an id and a full one gets an error.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::StoreError;

/// Size of the identifier space: ids are `0..ID_SPACE` rendered in decimal.
pub const ID_SPACE: u32 = 1_000_000;

/// Random samples tried before falling back to a sequential scan.
pub const MAX_RANDOM_ATTEMPTS: usize = 64;

/// Not cryptographically secure; ids are only required to be unique.
#[derive(Debug)]
pub struct IdGenerator {
    rng: StdRng,
    space: u32,
}

impl IdGenerator {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            space: ID_SPACE,
        }
    }

    /// Deterministic generator: same seed ⇒ same id stream for the same collection.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            space: ID_SPACE,
        }
    }

    #[cfg(test)]
    fn with_space(seed: u64, space: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            space,
        }
    }

    /// Returns an id for which `is_taken` is false.
    pub fn next_unique<F>(&mut self, is_taken: F) -> Result<String, StoreError>
    where
        F: Fn(&str) -> bool,
    {
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let candidate = self.rng.gen_range(0..self.space).to_string();
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
        }
        let start = self.rng.gen_range(0..self.space);
        (0..self.space)
            .map(|offset| ((start + offset) % self.space).to_string())
            .find(|candidate| !is_taken(candidate))
            .ok_or(StoreError::IdSpaceExhausted)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_decimal_and_in_range() {
        let mut ids = IdGenerator::with_seed(1);
        for _ in 0..100 {
            let id = ids.next_unique(|_| false).unwrap();
            let n: u32 = id.parse().unwrap();
            assert!(n < ID_SPACE);
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = IdGenerator::with_seed(42);
        let mut b = IdGenerator::with_seed(42);
        for _ in 0..10 {
            assert_eq!(a.next_unique(|_| false).unwrap(), b.next_unique(|_| false).unwrap());
        }
    }

    #[test]
    fn skips_taken_ids() {
        let mut ids = IdGenerator::with_space(7, 10);
        let taken: HashSet<String> = (0..9).map(|n| n.to_string()).collect();
        let id = ids.next_unique(|c| taken.contains(c)).unwrap();
        assert_eq!(id, "9");
    }

    #[test]
    fn full_space_is_exhausted() {
        let mut ids = IdGenerator::with_space(7, 5);
        let err = ids.next_unique(|_| true).unwrap_err();
        assert!(matches!(err, StoreError::IdSpaceExhausted));
    }

    #[test]
    fn repeated_generation_stays_unique() {
        let mut ids = IdGenerator::with_space(3, 200);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let id = ids.next_unique(|c| seen.contains(c)).unwrap();
            assert!(seen.insert(id));
        }
        assert!(ids.next_unique(|c| seen.contains(c)).is_err());
    }
}
