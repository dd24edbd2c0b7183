//! Operator types returned by [`Noise2DExt`](super::Noise2DExt) and
//! [`Noise3DExt`](super::Noise3DExt). Each wraps its operands by value and
//! implements whichever of `Noise2D`/`Noise3D` its operands implement.

use super::{Noise2D, Noise3D};

/// Fractal sum over octaves.
pub struct Octaves<N> {
    base: N,
    /// `(frequency divisor, amplitude)` per octave.
    layers: Vec<(f64, f64)>,
}

impl<N> Octaves<N> {
    pub(super) fn new(base: N, octaves: u32, persistence: f64) -> Self {
        let layers = (0..octaves)
            .map(|i| {
                let frequency = (1u64 << i) as f64;
                let amplitude = persistence.powi((octaves - i) as i32);
                (frequency, amplitude)
            })
            .collect();
        Self { base, layers }
    }

    /// Upper bound of `|output|` for a base bounded by 1.
    pub fn amplitude_bound(&self) -> f64 {
        self.layers.iter().map(|(_, a)| a.abs()).sum()
    }
}

impl<N: Noise2D> Noise2D for Octaves<N> {
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.layers
            .iter()
            .map(|&(f, a)| a * self.base.noise(x / f, z / f))
            .sum()
    }
}

impl<N: Noise3D> Noise3D for Octaves<N> {
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.layers
            .iter()
            .map(|&(f, a)| a * self.base.noise(x / f, y / f, z / f))
            .sum()
    }
}

pub struct Ridged<N>(pub(super) N);

#[inline]
fn ridge(value: f64) -> f64 {
    1.0 - 2.0 * value.abs()
}

impl<N: Noise2D> Noise2D for Ridged<N> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        ridge(self.0.noise(x, z))
    }
}

impl<N: Noise3D> Noise3D for Ridged<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        ridge(self.0.noise(x, y, z))
    }
}

pub struct Terraces<N> {
    base: N,
    levels: f64,
}

impl<N> Terraces<N> {
    pub(super) fn new(base: N, levels: u32) -> Self {
        Self {
            base,
            levels: levels.max(1) as f64,
        }
    }

    #[inline]
    fn step(&self, value: f64) -> f64 {
        let unit = (0.5 * value + 0.5).clamp(0.0, 1.0);
        // unit == 1 would land on an extra step
        let rounded = (unit * self.levels).floor().min(self.levels - 1.0);
        2.0 * rounded / self.levels - 1.0
    }
}

impl<N: Noise2D> Noise2D for Terraces<N> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.step(self.base.noise(x, z))
    }
}

impl<N: Noise3D> Noise3D for Terraces<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.step(self.base.noise(x, y, z))
    }
}

pub struct Spread<N> {
    base: N,
    scale: f64,
}

impl<N> Spread<N> {
    pub(super) fn new(base: N, scale: f64) -> Self {
        Self { base, scale }
    }
}

impl<N: Noise2D> Noise2D for Spread<N> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.base.noise(x * self.scale, z * self.scale)
    }
}

impl<N: Noise3D> Noise3D for Spread<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.base
            .noise(x * self.scale, y * self.scale, z * self.scale)
    }
}

/// Per-axis input scale, 3D only.
pub struct Stretched<N> {
    pub(super) base: N,
    pub(super) scale: [f64; 3],
}

impl<N: Noise3D> Noise3D for Stretched<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let [sx, sy, sz] = self.scale;
        self.base.noise(x * sx, y * sy, z * sz)
    }
}

/// Affine rescale.
pub struct Scaled<N> {
    base: N,
    old_min: f64,
    factor: f64,
    min: f64,
}

impl<N> Scaled<N> {
    pub(super) fn new(base: N, old_min: f64, old_max: f64, min: f64, max: f64) -> Self {
        Self {
            base,
            old_min,
            factor: (max - min) / (old_max - old_min),
            min,
        }
    }

    #[inline]
    fn apply(&self, value: f64) -> f64 {
        (value - self.old_min) * self.factor + self.min
    }
}

impl<N: Noise2D> Noise2D for Scaled<N> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.apply(self.base.noise(x, z))
    }
}

impl<N: Noise3D> Noise3D for Scaled<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.apply(self.base.noise(x, y, z))
    }
}

pub struct Flattened<N> {
    pub(super) base: N,
    pub(super) min: f64,
    pub(super) max: f64,
}

impl<N: Noise2D> Noise2D for Flattened<N> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.base.noise(x, z).clamp(self.min, self.max)
    }
}

impl<N: Noise3D> Noise3D for Flattened<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.base.noise(x, y, z).clamp(self.min, self.max)
    }
}

pub struct Abs<N>(pub(super) N);

impl<N: Noise2D> Noise2D for Abs<N> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.0.noise(x, z).abs()
    }
}

impl<N: Noise3D> Noise3D for Abs<N> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.0.noise(x, y, z).abs()
    }
}

/// Domain warp, 2D only.
pub struct Warped<N, WX, WZ> {
    pub(super) base: N,
    pub(super) warp_x: WX,
    pub(super) warp_z: WZ,
}

impl<N: Noise2D, WX: Noise2D, WZ: Noise2D> Noise2D for Warped<N, WX, WZ> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        let dx = self.warp_x.noise(x, z);
        let dz = self.warp_z.noise(x, z);
        self.base.noise(x + dx, z + dz)
    }
}

pub struct Add<A, B>(pub(super) A, pub(super) B);

impl<A: Noise2D, B: Noise2D> Noise2D for Add<A, B> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.0.noise(x, z) + self.1.noise(x, z)
    }
}

impl<A: Noise3D, B: Noise3D> Noise3D for Add<A, B> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.0.noise(x, y, z) + self.1.noise(x, y, z)
    }
}

pub struct LazyProduct<A, B>(pub(super) A, pub(super) B);

impl<A: Noise2D, B: Noise2D> Noise2D for LazyProduct<A, B> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        let a = self.0.noise(x, z);
        if a == 0.0 { 0.0 } else { a * self.1.noise(x, z) }
    }
}

impl<A: Noise3D, B: Noise3D> Noise3D for LazyProduct<A, B> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let a = self.0.noise(x, y, z);
        if a == 0.0 { 0.0 } else { a * self.1.noise(x, y, z) }
    }
}

pub struct Map<N, F> {
    pub(super) base: N,
    pub(super) f: F,
}

impl<N: Noise2D, F: Fn(f64) -> f64 + Send + Sync> Noise2D for Map<N, F> {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        (self.f)(self.base.noise(x, z))
    }
}

impl<N: Noise3D, F: Fn(f64) -> f64 + Send + Sync> Noise3D for Map<N, F> {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        (self.f)(self.base.noise(x, y, z))
    }
}
