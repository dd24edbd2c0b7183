//! World-wide 3D density functions.
//!
//! Built once per seed and shared read-only by every chunk fill. Each
//! [`DensityChannel`] gets its own interpolator in a chunk; the aquifer
//! noises are sampled directly at aquifer centers instead.

use std::sync::Arc;

use crate::noise::{
    FnNoise3D, Noise2D, Noise2DExt, Noise3D, Noise3DExt, OpenSimplex2D, OpenSimplex3D,
    SharedNoise3D,
};
use crate::seed::derive_seed;

/// Interpolated density channels, in bank order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DensityChannel {
    /// Overhang perturbation of the column surface.
    TerrainBase,
    /// Flat winding tunnels that follow a 2D path at a varying depth.
    Spaghetti2D,
    /// Tunnels along the intersection of two 3D ridges.
    Spaghetti3D,
    /// Where noodle caves are enabled (`>= 0`).
    NoodleToggle,
    NoodleThickness,
    NoodleRidgeA,
    NoodleRidgeB,
    /// Large layered caverns.
    Cheese,
    /// Stone pillars left standing inside caverns.
    Pillar,
    /// Walls between neighbouring aquifers.
    AquiferBarrier,
}

impl DensityChannel {
    pub const ALL: [DensityChannel; 10] = [
        Self::TerrainBase,
        Self::Spaghetti2D,
        Self::Spaghetti3D,
        Self::NoodleToggle,
        Self::NoodleThickness,
        Self::NoodleRidgeA,
        Self::NoodleRidgeB,
        Self::Cheese,
        Self::Pillar,
        Self::AquiferBarrier,
    ];

    pub const COUNT: usize = Self::ALL.len();

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::TerrainBase => "terrain_base",
            Self::Spaghetti2D => "spaghetti_2d",
            Self::Spaghetti3D => "spaghetti_3d",
            Self::NoodleToggle => "noodle_toggle",
            Self::NoodleThickness => "noodle_thickness",
            Self::NoodleRidgeA => "noodle_ridge_a",
            Self::NoodleRidgeB => "noodle_ridge_b",
            Self::Cheese => "cheese",
            Self::Pillar => "pillar",
            Self::AquiferBarrier => "aquifer_barrier",
        }
    }
}

/// Noises the aquifer samples at its own grid points.
pub struct AquiferNoises {
    /// Chance that an aquifer takes the global fluid level. Sampled at `(x, y * 0.67, z)`.
    pub floodedness: SharedNoise3D,
    /// Local fluid level offset. Sampled on a 16x40x16 block grid.
    pub spread: SharedNoise3D,
    /// Deep aquifers holding lava. Sampled on a 64x40x64 block grid.
    pub lava: SharedNoise3D,
    /// Seed for aquifer center jitter.
    pub center_seed: u64,
}

pub struct NoiseSampler {
    channels: Vec<SharedNoise3D>,
    aquifer: AquiferNoises,
}

impl NoiseSampler {
    pub fn new(world_seed: i64) -> Self {
        let seed = |channel: &str| derive_seed(world_seed, &format!("density/{channel}"));
        let channels = DensityChannel::ALL
            .iter()
            .map(|&channel| build_channel(channel, seed(channel.name())))
            .collect();
        Self {
            channels,
            aquifer: AquiferNoises {
                floodedness: OpenSimplex3D::new(seed("aquifer_floodedness"))
                    .octaves(2, 0.5)
                    .scaled_from(-0.75, 0.75, -1.0, 1.0)
                    .stretched(1.0 / 48.0, 0.67 / 48.0, 1.0 / 48.0)
                    .shared(),
                spread: OpenSimplex3D::new(seed("aquifer_spread"))
                    .stretched(0.6, 0.6 / 1.4, 0.6)
                    .shared(),
                lava: OpenSimplex3D::new(seed("aquifer_lava")).spread(0.7).shared(),
                center_seed: seed("aquifer_centers"),
            },
        }
    }

    #[inline]
    pub fn channel(&self, channel: DensityChannel) -> &dyn Noise3D {
        self.channels[channel.index()].as_ref()
    }

    /// Every channel in bank order.
    pub fn channels(&self) -> impl Iterator<Item = &dyn Noise3D> {
        self.channels.iter().map(|noise| noise.as_ref() as &dyn Noise3D)
    }

    pub fn aquifer(&self) -> &AquiferNoises {
        &self.aquifer
    }
}

fn build_channel(channel: DensityChannel, seed: u64) -> SharedNoise3D {
    let simplex = |salt: u64| OpenSimplex3D::new(seed ^ salt);
    match channel {
        DensityChannel::TerrainBase => simplex(0).octaves(3, 0.5).spread(0.04).shared(),
        DensityChannel::Spaghetti2D => {
            let path = Arc::new(OpenSimplex2D::new(seed).octaves(2, 0.5).spread(0.012));
            let depth = Arc::new(
                OpenSimplex2D::new(seed ^ 1)
                    .spread(0.004)
                    .scaled(-40.0, 24.0),
            );
            FnNoise3D(move |x: f64, y: f64, z: f64| {
                let across = path.noise(x, z).abs() - 0.04;
                let vertical = (y - depth.noise(x, z)).abs() / 24.0 - 0.12;
                across.max(vertical) * 4.0
            })
            .shared()
        }
        DensityChannel::Spaghetti3D => {
            let a = simplex(2).spread(0.03);
            let b = simplex(3).spread(0.03);
            let rarity = simplex(4).spread(0.005).scaled(0.06, 0.1);
            FnNoise3D(move |x: f64, y: f64, z: f64| {
                let ridge = a.noise(x, y, z).abs().max(b.noise(x, y, z).abs());
                (ridge - rarity.noise(x, y, z)) * 4.0
            })
            .shared()
        }
        DensityChannel::NoodleToggle => simplex(5).spread(0.01).shared(),
        DensityChannel::NoodleThickness => simplex(6).spread(0.02).shared(),
        DensityChannel::NoodleRidgeA => simplex(7).spread(2.0 / 75.0).shared(),
        DensityChannel::NoodleRidgeB => simplex(8).spread(2.0 / 75.0).shared(),
        DensityChannel::Cheese => simplex(9)
            .octaves(2, 0.5)
            .stretched(1.0 / 64.0, 1.0 / 32.0, 1.0 / 64.0)
            .map(|n| (n + 0.3) * 2.0)
            .shared(),
        DensityChannel::Pillar => simplex(10)
            .stretched(0.09, 0.015, 0.09)
            .map(|n| (n - 0.55) * 4.0)
            .shared(),
        DensityChannel::AquiferBarrier => simplex(11).stretched(0.06, 0.03, 0.06).shared(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_indices_match_order() {
        for (i, channel) in DensityChannel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn test_sampler_is_deterministic() {
        let a = NoiseSampler::new(9);
        let b = NoiseSampler::new(9);
        for channel in DensityChannel::ALL {
            for i in 0..20 {
                let (x, y, z) = (i as f64 * 7.0, i as f64 * -3.0, i as f64 * 11.0);
                assert_eq!(a.channel(channel).noise(x, y, z), b.channel(channel).noise(x, y, z));
            }
        }
        assert_eq!(a.channels().count(), DensityChannel::COUNT);
    }

    #[test]
    fn test_channels_differ() {
        let sampler = NoiseSampler::new(3);
        let ridge_a = sampler.channel(DensityChannel::NoodleRidgeA);
        let ridge_b = sampler.channel(DensityChannel::NoodleRidgeB);
        let differs = (0..50).any(|i| {
            let p = i as f64 * 5.3;
            ridge_a.noise(p, -p, p * 0.5) != ridge_b.noise(p, -p, p * 0.5)
        });
        assert!(differs);
    }
}
