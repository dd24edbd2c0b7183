//! Gradient noise primitives backed by the `noise` crate.
//!
//! Outputs are clamped to `[-1, 1]` so downstream `scaled` ranges hold exactly.

use ::noise::{NoiseFn, OpenSimplex, Simplex};

use super::{Noise2D, Noise3D};
use crate::seed::noise_seed;

macro_rules! gradient_primitive {
    ($(#[$meta:meta])* $name:ident, $inner:ty, 2) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            inner: $inner,
        }

        impl $name {
            pub fn new(seed: u64) -> Self {
                Self {
                    inner: <$inner>::new(noise_seed(seed)),
                }
            }
        }

        impl Noise2D for $name {
            #[inline]
            fn noise(&self, x: f64, z: f64) -> f64 {
                self.inner.get([x, z]).clamp(-1.0, 1.0)
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, $inner:ty, 3) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            inner: $inner,
        }

        impl $name {
            pub fn new(seed: u64) -> Self {
                Self {
                    inner: <$inner>::new(noise_seed(seed)),
                }
            }
        }

        impl Noise3D for $name {
            #[inline]
            fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
                self.inner.get([x, y, z]).clamp(-1.0, 1.0)
            }
        }
    };
}

gradient_primitive!(
    /// 2D simplex noise.
    Simplex2D, Simplex, 2
);
gradient_primitive!(
    /// 3D simplex noise.
    Simplex3D, Simplex, 3
);
gradient_primitive!(
    /// 2D OpenSimplex noise. The default choice for height layers.
    OpenSimplex2D, OpenSimplex, 2
);
gradient_primitive!(
    /// 3D OpenSimplex noise. Used by the cave and aquifer channels.
    OpenSimplex3D, OpenSimplex, 3
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let a = OpenSimplex2D::new(1234);
        let b = OpenSimplex2D::new(1234);
        for i in 0..200 {
            let (x, z) = (i as f64 * 0.37, i as f64 * -0.91);
            assert_eq!(a.noise(x, z), b.noise(x, z));
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = Simplex3D::new(1);
        let b = Simplex3D::new(2);
        let differing = (0..100)
            .filter(|&i| {
                let p = i as f64 * 0.61;
                a.noise(p, -p, p * 0.5) != b.noise(p, -p, p * 0.5)
            })
            .count();
        assert!(differing > 50, "seeds should decorrelate: {differing}/100 differ");
    }

    #[test]
    fn test_output_in_unit_range() {
        let n2 = Simplex2D::new(77);
        let n3 = OpenSimplex3D::new(77);
        for i in -300..300 {
            let p = i as f64 * 0.173;
            let v2 = n2.noise(p, p * 1.7);
            let v3 = n3.noise(p, p * -0.3, p * 2.1);
            assert!((-1.0..=1.0).contains(&v2), "2D out of range: {v2}");
            assert!((-1.0..=1.0).contains(&v3), "3D out of range: {v3}");
        }
    }
}
