//! Internal utilities shared across the engine.

pub mod det_hash;

pub use det_hash::{DetBuildHasher, DetHashMap, DetHashSet, DetHasher};
