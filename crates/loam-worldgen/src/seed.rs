//! Deterministic seeding utilities.
//!
//! Every random decision in the generator is a pure function of the world
//! seed and a position or salt: sub-seeds for noise layers are derived by
//! hashing, positional choices use a stateless integer mix, and anything that
//! needs a stream of numbers gets its own `ChaCha8Rng`. Trigonometry goes
//! through `libm` so river geometry is identical across platforms.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a sub-seed for a named layer from the world seed.
///
/// Uses SipHash (via std's `DefaultHasher`) so distinct salts give unrelated
/// seeds even for adjacent world seeds.
pub fn derive_seed(world_seed: i64, salt: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    salt.hash(&mut hasher);
    hasher.finish()
}

/// Fold a 64-bit seed into the 32-bit seed taken by `noise` generators.
#[inline]
pub fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Stateless 3D integer hash (splitmix64 finalizer over a combined key).
#[inline]
pub fn mix(seed: u64, x: i32, y: i32, z: i32) -> u64 {
    let mut h = seed
        ^ (x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (z as i64 as u64).wrapping_mul(0x1656_67B1_9E37_79F9);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 31)
}

/// Map a hash to a float in `[0, 1)` using its top 53 bits.
#[inline]
pub fn unit_f64(hash: u64) -> f64 {
    (hash >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Deterministic RNG for a lattice position.
pub fn positional_rng(seed: u64, x: i32, y: i32, z: i32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(mix(seed, x, y, z))
}

/// Deterministic sine using libm (not platform libc).
#[inline]
pub fn det_sin(x: f64) -> f64 {
    libm::sin(x)
}

/// Deterministic cosine using libm.
#[inline]
pub fn det_cos(x: f64) -> f64 {
    libm::cos(x)
}

/// Deterministic atan2 using libm.
#[inline]
pub fn det_atan2(y: f64, x: f64) -> f64 {
    libm::atan2(y, x)
}

/// Deterministic sqrt using libm.
#[inline]
pub fn det_sqrt(x: f64) -> f64 {
    libm::sqrt(x)
}
