//! Composable 2D and 3D noise functions.
//!
//! A noise function is an immutable, pure map from coordinates to a scalar.
//! Primitives ([`OpenSimplex2D`], [`Simplex3D`], [`Cellular2D`], ...) return
//! values in `[-1, 1]` (cellular distances excepted, see [`cellular`]).
//! Operators on the [`Noise2DExt`] / [`Noise3DExt`] traits consume their
//! operands and return a new function, so a layer is built once per seed by
//! chaining, then shared read-only across generation threads:
//!
//! ```
//! use loam_worldgen::noise::{Noise2D, Noise2DExt, OpenSimplex2D};
//!
//! let hills = OpenSimplex2D::new(7)
//!     .octaves(4, 0.5)
//!     .spread(0.05)
//!     .scaled(-8.0, 24.0);
//! let h = hills.noise(100.0, -40.0);
//! assert!((-8.0..=24.0).contains(&h));
//! ```

pub mod cellular;
mod ops;
mod primitives;

use std::sync::Arc;

pub use cellular::{Cell2D, Cell3D, Cellular2D, Cellular3D, CellularReturn};
pub use ops::{
    Abs, Add, Flattened, LazyProduct, Map, Octaves, Ridged, Scaled, Spread, Stretched, Terraces,
    Warped,
};
pub use primitives::{OpenSimplex2D, OpenSimplex3D, Simplex2D, Simplex3D};

/// A pure 2D scalar field over the horizontal plane.
pub trait Noise2D: Send + Sync {
    fn noise(&self, x: f64, z: f64) -> f64;
}

/// A pure 3D scalar field.
pub trait Noise3D: Send + Sync {
    fn noise(&self, x: f64, y: f64, z: f64) -> f64;
}

/// Type-erased 2D noise, shared between threads.
pub type SharedNoise2D = Arc<dyn Noise2D>;

/// Type-erased 3D noise, shared between threads.
pub type SharedNoise3D = Arc<dyn Noise3D>;

impl<T: Noise2D + ?Sized> Noise2D for Arc<T> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        (**self).noise(x, z)
    }
}

impl<T: Noise2D + ?Sized> Noise2D for Box<T> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        (**self).noise(x, z)
    }
}

impl<T: Noise2D + ?Sized> Noise2D for &T {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        (**self).noise(x, z)
    }
}

impl<T: Noise3D + ?Sized> Noise3D for Arc<T> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        (**self).noise(x, y, z)
    }
}

impl<T: Noise3D + ?Sized> Noise3D for Box<T> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        (**self).noise(x, y, z)
    }
}

impl<T: Noise3D + ?Sized> Noise3D for &T {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        (**self).noise(x, y, z)
    }
}

/// Adapts a closure into a 2D noise function.
pub struct FnNoise2D<F>(pub F);

impl<F: Fn(f64, f64) -> f64 + Send + Sync> Noise2D for FnNoise2D<F> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        (self.0)(x, z)
    }
}

/// Adapts a closure into a 3D noise function.
pub struct FnNoise3D<F>(pub F);

impl<F: Fn(f64, f64, f64) -> f64 + Send + Sync> Noise3D for FnNoise3D<F> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        (self.0)(x, y, z)
    }
}

/// Composition operators for 2D noise.
pub trait Noise2DExt: Noise2D + Sized {
    /// Sum of `octaves` copies at frequency `2^-i` and amplitude `persistence^(octaves - i)`.
    fn octaves(self, octaves: u32, persistence: f64) -> Octaves<Self> {
        Octaves::new(self, octaves, persistence)
    }

    /// `1 - 2|n|`: sharp crests where the base crosses zero.
    fn ridged(self) -> Ridged<Self> {
        Ridged(self)
    }

    /// Quantize `[-1, 1]` into `levels` flat steps.
    fn terraces(self, levels: u32) -> Terraces<Self> {
        Terraces::new(self, levels)
    }

    /// Multiply input coordinates by `scale`. Smaller values give larger features.
    fn spread(self, scale: f64) -> Spread<Self> {
        Spread::new(self, scale)
    }

    /// Rescale from `[-1, 1]` to `[min, max]`.
    fn scaled(self, min: f64, max: f64) -> Scaled<Self> {
        Scaled::new(self, -1.0, 1.0, min, max)
    }

    /// Rescale from `[old_min, old_max]` to `[min, max]`.
    fn scaled_from(self, old_min: f64, old_max: f64, min: f64, max: f64) -> Scaled<Self> {
        Scaled::new(self, old_min, old_max, min, max)
    }

    /// Clamp to `[min, max]`.
    fn flattened(self, min: f64, max: f64) -> Flattened<Self> {
        Flattened { base: self, min, max }
    }

    fn abs(self) -> Abs<Self> {
        Abs(self)
    }

    /// Offset input coordinates by two auxiliary fields before sampling.
    fn warped<WX: Noise2D, WZ: Noise2D>(self, warp_x: WX, warp_z: WZ) -> Warped<Self, WX, WZ> {
        Warped {
            base: self,
            warp_x,
            warp_z,
        }
    }

    fn add<O: Noise2D>(self, other: O) -> Add<Self, O> {
        Add(self, other)
    }

    /// `self * other`, skipping `other` wherever `self` is zero.
    fn lazy_product<O: Noise2D>(self, other: O) -> LazyProduct<Self, O> {
        LazyProduct(self, other)
    }

    fn map<F: Fn(f64) -> f64 + Send + Sync>(self, f: F) -> Map<Self, F> {
        Map { base: self, f }
    }

    /// Erase the concrete type.
    fn shared(self) -> SharedNoise2D
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<T: Noise2D> Noise2DExt for T {}

/// Composition operators for 3D noise.
pub trait Noise3DExt: Noise3D + Sized {
    /// Sum of `octaves` copies at frequency `2^-i` and amplitude `persistence^(octaves - i)`.
    fn octaves(self, octaves: u32, persistence: f64) -> Octaves<Self> {
        Octaves::new(self, octaves, persistence)
    }

    /// `1 - 2|n|`.
    fn ridged(self) -> Ridged<Self> {
        Ridged(self)
    }

    fn terraces(self, levels: u32) -> Terraces<Self> {
        Terraces::new(self, levels)
    }

    /// Multiply all input coordinates by `scale`.
    fn spread(self, scale: f64) -> Spread<Self> {
        Spread::new(self, scale)
    }

    /// Multiply input coordinates by a per-axis scale.
    fn stretched(self, x: f64, y: f64, z: f64) -> Stretched<Self> {
        Stretched {
            base: self,
            scale: [x, y, z],
        }
    }

    /// Rescale from `[-1, 1]` to `[min, max]`.
    fn scaled(self, min: f64, max: f64) -> Scaled<Self> {
        Scaled::new(self, -1.0, 1.0, min, max)
    }

    fn scaled_from(self, old_min: f64, old_max: f64, min: f64, max: f64) -> Scaled<Self> {
        Scaled::new(self, old_min, old_max, min, max)
    }

    fn flattened(self, min: f64, max: f64) -> Flattened<Self> {
        Flattened { base: self, min, max }
    }

    fn abs(self) -> Abs<Self> {
        Abs(self)
    }

    fn add<O: Noise3D>(self, other: O) -> Add<Self, O> {
        Add(self, other)
    }

    fn lazy_product<O: Noise3D>(self, other: O) -> LazyProduct<Self, O> {
        LazyProduct(self, other)
    }

    fn map<F: Fn(f64) -> f64 + Send + Sync>(self, f: F) -> Map<Self, F> {
        Map { base: self, f }
    }

    fn shared(self) -> SharedNoise3D
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<T: Noise3D> Noise3DExt for T {}
