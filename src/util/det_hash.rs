//! Deterministic hashing utilities for reproducible simulation runs.
//!
//! The engine's determinism property (spec §8) requires that iteration
//! order over the active set and request registry never depends on
//! `RandomState`'s per-process seed. Every `HashMap`/`HashSet` the engine
//! touches is keyed by this fixed-seed hasher instead of the std default.

use std::hash::{BuildHasher, Hasher};

/// Deterministic, non-cryptographic hasher with a fixed seed.
#[derive(Debug, Clone)]
pub struct DetHasher {
    state: u64,
}

impl DetHasher {
    const SEED: u64 = 0x16f1_1fe8_9b0d_677c;
    const MULTIPLIER: u64 = 0x517c_c1b7_2722_0a95;
}

impl Default for DetHasher {
    fn default() -> Self {
        Self { state: Self::SEED }
    }
}

impl Hasher for DetHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(Self::MULTIPLIER);
            self.state ^= u64::from(byte);
        }
    }

    fn write_u64(&mut self, i: u64) {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ i;
    }

    fn write_usize(&mut self, i: usize) {
        self.write_u64(i as u64);
    }

    fn finish(&self) -> u64 {
        let mut h = self.state;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        h
    }
}

/// Builder for [`DetHasher`].
#[derive(Clone, Default)]
pub struct DetBuildHasher;

impl BuildHasher for DetBuildHasher {
    type Hasher = DetHasher;

    fn build_hasher(&self) -> Self::Hasher {
        DetHasher::default()
    }
}

/// A `HashMap` with reproducible iteration order across runs and platforms.
pub type DetHashMap<K, V> = std::collections::HashMap<K, V, DetBuildHasher>;

/// A `HashSet` with reproducible iteration order across runs and platforms.
pub type DetHashSet<K> = std::collections::HashSet<K, DetBuildHasher>;
