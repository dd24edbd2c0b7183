//! Thread-safe memoization of pure 2D sampling functions.
//!
//! [`ConcurrentAreaCache`] is a direct-mapped table: each key hashes to one
//! slot, and a miss overwrites whatever the slot held. Values are computed
//! outside the slot lock, so two threads racing on a key may both compute it.
//! The source is pure, so either result is correct. The cache never changes
//! what `get` returns, only how often the source runs.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::units::pack;

/// A pure `(x, z) -> T` function.
pub trait AreaSource<T>: Send + Sync {
    fn sample(&self, x: i32, z: i32) -> T;
}

/// Adapts a closure into an [`AreaSource`].
pub struct FnSource<F>(pub F);

impl<T, F: Fn(i32, i32) -> T + Send + Sync> AreaSource<T> for FnSource<F> {
    #[inline]
    fn sample(&self, x: i32, z: i32) -> T {
        (self.0)(x, z)
    }
}

/// Largest accepted `bits` value.
pub const MAX_CACHE_BITS: u32 = 24;

type Slot<T> = RwLock<Option<(u64, T)>>;

/// Fixed-capacity, power-of-two sized memo table over an [`AreaSource`].
pub struct ConcurrentAreaCache<T, S> {
    source: S,
    slots: Box<[Slot<T>]>,
    mask: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Clone + Send + Sync, S: AreaSource<T>> ConcurrentAreaCache<T, S> {
    /// Wrap `source` with `2^bits` slots.
    ///
    /// # Panics
    ///
    /// Panics if `bits` exceeds [`MAX_CACHE_BITS`]. Config validation keeps it in range.
    pub fn new(source: S, bits: u32) -> Self {
        assert!(
            bits <= MAX_CACHE_BITS,
            "area cache bits {bits} exceeds {MAX_CACHE_BITS}"
        );
        let capacity = 1usize << bits;
        let slots = (0..capacity).map(|_| RwLock::new(None)).collect();
        Self {
            source,
            slots,
            mask: capacity as u64 - 1,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    fn slot_index(&self, key: u64) -> usize {
        // Fibonacci hashing spreads neighbouring coordinates over the table.
        (key.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(32) & self.mask) as usize
    }

    /// The value of the source at `(x, z)`, memoized.
    pub fn get(&self, x: i32, z: i32) -> T {
        let key = pack(x, z);
        let slot = &self.slots[self.slot_index(key)];

        if let Some((stored, value)) = slot.read().as_ref()
            && *stored == key
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = self.source.sample(x, z);
        *slot.write() = Some((key, value.clone()));
        value
    }

    /// Number of slots. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl<T: Clone + Send + Sync, S: AreaSource<T>> AreaSource<T> for ConcurrentAreaCache<T, S> {
    #[inline]
    fn sample(&self, x: i32, z: i32) -> T {
        self.get(x, z)
    }
}
