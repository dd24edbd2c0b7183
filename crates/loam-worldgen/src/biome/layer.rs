//! Quart column to terrain variant.
//!
//! The layer works top down: plates decide ocean or land, distance to the
//! opposite kind of plate adds shores and shallow seas, rivers and lakes cut
//! into land, and whatever is left is picked from the plate's elevation and
//! a detail field.

use std::sync::Arc;

use super::variant::VariantKind;
use crate::area_cache::AreaSource;
use crate::noise::{Cellular2D, Noise2D, Noise2DExt, OpenSimplex2D, SharedNoise2D};
use crate::river::{RIVER_WIDTH, WatershedContext};
use crate::seed::derive_seed;
use crate::units::quart_to_grid_f64;

/// Coast band widths in grid units.
const SHORE_WIDTH: f64 = 0.04;
const SHALLOW_WIDTH: f64 = 0.45;

/// Land terrain by ascending elevation.
const LAND_BANDS: [(f64, VariantKind); 10] = [
    (0.12, VariantKind::Lowlands),
    (0.24, VariantKind::Plains),
    (0.34, VariantKind::Hills),
    (0.42, VariantKind::LowCanyons),
    (0.50, VariantKind::RollingHills),
    (0.56, VariantKind::Badlands),
    (0.62, VariantKind::Plateau),
    (0.70, VariantKind::Canyons),
    (0.78, VariantKind::OldMountains),
    (0.90, VariantKind::Mountains),
];

pub struct VariantLayer {
    watersheds: Arc<WatershedContext>,
    warp_x: SharedNoise2D,
    warp_z: SharedNoise2D,
    detail: SharedNoise2D,
    lakes: Cellular2D,
}

impl VariantLayer {
    pub fn new(world_seed: i64, watersheds: Arc<WatershedContext>) -> Self {
        let warp = |salt: &str| {
            OpenSimplex2D::new(derive_seed(world_seed, salt))
                .octaves(3, 0.5)
                .spread(2.0)
                .scaled(-0.35, 0.35)
                .shared()
        };
        Self {
            warp_x: warp("variants/warp_x"),
            warp_z: warp("variants/warp_z"),
            detail: OpenSimplex2D::new(derive_seed(world_seed, "variants/detail"))
                .octaves(2, 0.5)
                .spread(0.02)
                .scaled_from(-0.75, 0.75, 0.0, 1.0)
                .flattened(0.0, 1.0)
                .shared(),
            lakes: Cellular2D::new(derive_seed(world_seed, "variants/lakes")).with_frequency(0.02),
            watersheds,
        }
    }

    pub fn watersheds(&self) -> &Arc<WatershedContext> {
        &self.watersheds
    }

    fn oceanic_at(&self, gx: f64, gz: f64) -> bool {
        self.watersheds
            .plate_at(gx.floor() as i32, gz.floor() as i32)
            .oceanic
    }

    /// Whether any of four points `distance` away has a different plate kind.
    fn near_coast(&self, gx: f64, gz: f64, oceanic: bool, distance: f64) -> bool {
        [(distance, 0.0), (-distance, 0.0), (0.0, distance), (0.0, -distance)]
            .into_iter()
            .any(|(dx, dz)| self.oceanic_at(gx + dx, gz + dz) != oceanic)
    }

    pub fn variant_at(&self, quart_x: i32, quart_z: i32) -> VariantKind {
        let (qx, qz) = (quart_x as f64, quart_z as f64);
        let (gx, gz) = (quart_to_grid_f64(qx + 0.5), quart_to_grid_f64(qz + 0.5));
        // Coastlines follow the warped plate field, rivers the unwarped one.
        let wx = gx + self.warp_x.noise(gx, gz);
        let wz = gz + self.warp_z.noise(gx, gz);
        let plate = self
            .watersheds
            .plate_at(wx.floor() as i32, wz.floor() as i32);
        let detail = self.detail.noise(qx, qz);

        if plate.oceanic {
            return if self.near_coast(wx, wz, true, SHORE_WIDTH) {
                VariantKind::Shore
            } else if self.near_coast(wx, wz, true, SHALLOW_WIDTH) {
                if detail > 0.7 {
                    VariantKind::OceanReef
                } else {
                    VariantKind::Ocean
                }
            } else if plate.elevation < 0.12 {
                VariantKind::DeepOceanTrench
            } else {
                VariantKind::DeepOcean
            };
        }

        if self.near_coast(wx, wz, false, SHORE_WIDTH) {
            return VariantKind::Shore;
        }

        let base = self.land_variant(plate.elevation as f64, detail, wx, wz);
        if self.watersheds.intersect(gx, gz, RIVER_WIDTH) {
            return base.with_river();
        }
        let lake = self.lakes.cell(qx, qz);
        if lake.value < 0.1 && lake.f1 < 0.28 {
            return base.with_lake();
        }
        base
    }

    fn land_variant(&self, elevation: f64, detail: f64, wx: f64, wz: f64) -> VariantKind {
        let e = elevation * 0.7 + detail * 0.3;
        let coastal = self.near_coast(wx, wz, false, SHALLOW_WIDTH);
        let kind = LAND_BANDS
            .iter()
            .find(|(limit, _)| e < *limit)
            .map_or(VariantKind::VolcanicMountains, |(_, kind)| *kind);
        match kind {
            VariantKind::Badlands if detail > 0.5 => VariantKind::InvertedBadlands,
            VariantKind::Mountains if coastal => VariantKind::OceanicMountains,
            VariantKind::VolcanicMountains if coastal => VariantKind::VolcanicOceanicMountains,
            other => other,
        }
    }
}

impl AreaSource<VariantKind> for VariantLayer {
    #[inline]
    fn sample(&self, x: i32, z: i32) -> VariantKind {
        self.variant_at(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_config::Config;

    fn layer(seed: i64) -> VariantLayer {
        let mut config = Config::default();
        config.world.seed = seed;
        VariantLayer::new(seed, Arc::new(WatershedContext::new(&config)))
    }

    #[test]
    fn test_layer_is_deterministic() {
        let a = layer(42);
        let b = layer(42);
        for i in -100..100 {
            let (x, z) = (i * 37, i * -53);
            assert_eq!(a.variant_at(x, z), b.variant_at(x, z));
        }
    }

    #[test]
    fn test_ocean_plates_give_ocean_variants() {
        let layer = layer(7);
        for i in -200..200 {
            let (x, z) = (i * 61, i * 17);
            let kind = layer.variant_at(x, z);
            let (gx, gz) = (
                quart_to_grid_f64(x as f64 + 0.5),
                quart_to_grid_f64(z as f64 + 0.5),
            );
            let wx = gx + layer.warp_x.noise(gx, gz);
            let wz = gz + layer.warp_z.noise(gx, gz);
            if layer.oceanic_at(wx, wz) {
                assert!(kind.is_ocean(), "{kind} on an oceanic plate");
            } else {
                assert!(!kind.is_ocean() || kind == VariantKind::Shore, "{kind} on land");
            }
        }
    }

    #[test]
    fn test_land_bands_are_ascending() {
        assert!(LAND_BANDS.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
