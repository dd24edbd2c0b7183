//! Blended surface height.
//!
//! Each column mixes the height fields of the variants in a small quart
//! neighbourhood, weighted by distance, so borders between variants become
//! slopes instead of cliffs. River channels are then cut into the blended
//! surface along the river centerlines.

use crate::area_cache::AreaSource;
use crate::noise::{Noise2D, SharedNoise2D};
use crate::river::{Flow, WatershedContext};
use crate::seed::derive_seed;
use crate::units::block_to_quart;

use super::height::{CarvingNoise, with_volcanoes};
use super::variant::{BiomeGroup, BlendGroup, Carving, HeightNoise, VariantKind};

/// Blend kernel radius in blocks.
const BLEND_RADIUS: f64 = 10.0;
/// Quarts searched on each side of the column's quart.
const BLEND_QUARTS: i32 = 3;

/// Everything the chunk sampler needs about one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceColumn {
    pub height: f64,
    pub variant: VariantKind,
    /// Carved underground water body as `(bottom, top)`.
    pub carving: Option<(f64, f64)>,
    pub flow: Flow,
}

pub struct SurfaceSampler {
    heights: Vec<SharedNoise2D>,
    river: SharedNoise2D,
    river_carving: CarvingNoise,
    lake_carving: CarvingNoise,
}

#[inline]
fn kernel(dx: f64, dz: f64) -> f64 {
    let t = 1.0 - (dx * dx + dz * dz) / (BLEND_RADIUS * BLEND_RADIUS);
    if t > 0.0 { t * t } else { 0.0 }
}

impl SurfaceSampler {
    pub fn new(world_seed: i64, sea_level: i32) -> Self {
        let sea_level = sea_level as f64;
        let volcano_seed = derive_seed(world_seed, "height/volcanoes");
        // Variants with identical height parameters share one field, so a
        // mountain and its river variant line up.
        let heights = VariantKind::ALL
            .iter()
            .map(|kind| {
                let variant = kind.variant();
                let seed = derive_seed(world_seed, &format!("height/{:?}", variant.height));
                let base = variant.height.build(seed, sea_level);
                match variant.volcanoes {
                    Some(params) => with_volcanoes(base, volcano_seed, params, sea_level),
                    None => base,
                }
            })
            .collect();
        let river_seed = derive_seed(world_seed, &format!("height/{:?}", HeightNoise::River));
        Self {
            heights,
            river: HeightNoise::River.build(river_seed, sea_level),
            river_carving: CarvingNoise::river(derive_seed(world_seed, "carving/river"), sea_level),
            lake_carving: CarvingNoise::lake(derive_seed(world_seed, "carving/lake"), sea_level),
        }
    }

    /// Unblended surface of one variant.
    #[inline]
    pub fn variant_height(&self, kind: VariantKind, block_x: f64, block_z: f64) -> f64 {
        self.heights[kind.index()].noise(block_x, block_z)
    }

    /// Blended surface height without river channels.
    pub fn blended_height(
        &self,
        variants: &impl AreaSource<VariantKind>,
        block_x: i32,
        block_z: i32,
    ) -> f64 {
        let (x, z) = (block_x as f64 + 0.5, block_z as f64 + 0.5);
        let (qx, qz) = (block_to_quart(block_x), block_to_quart(block_z));

        let mut weights = [0.0f64; VariantKind::COUNT];
        let mut body = 0.0;
        for ox in -BLEND_QUARTS..=BLEND_QUARTS {
            for oz in -BLEND_QUARTS..=BLEND_QUARTS {
                let (sx, sz) = (qx + ox, qz + oz);
                let w = kernel((sx * 4 + 2) as f64 - x, (sz * 4 + 2) as f64 - z);
                if w <= 0.0 {
                    continue;
                }
                let kind = variants.sample(sx, sz);
                if kind.variant().blend_group() == BlendGroup::Body {
                    weights[kind.index()] += w;
                    body += w;
                }
            }
        }

        if body <= 0.0 {
            return self.river.noise(x, z);
        }
        weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, w)| w * self.heights[i].noise(x, z))
            .sum::<f64>()
            / body
    }

    /// Surface height with river channels cut in.
    pub fn height(
        &self,
        variants: &impl AreaSource<VariantKind>,
        watersheds: &WatershedContext,
        block_x: i32,
        block_z: i32,
    ) -> f64 {
        self.column(variants, watersheds, block_x, block_z).height
    }

    pub fn column(
        &self,
        variants: &impl AreaSource<VariantKind>,
        watersheds: &WatershedContext,
        block_x: i32,
        block_z: i32,
    ) -> SurfaceColumn {
        let variant = variants.sample(block_to_quart(block_x), block_to_quart(block_z));
        let properties = variant.variant();
        let (x, z) = (block_x as f64 + 0.5, block_z as f64 + 0.5);

        let mut height = self.blended_height(variants, block_x, block_z);
        let flow = if properties.group == BiomeGroup::Ocean {
            Flow::None
        } else {
            watersheds.flow_at(block_x, block_z)
        };
        if properties.carving == Carving::None
            && let Flow::Flowing { strength, .. } = flow
        {
            let bed = self.river.noise(x, z).min(height);
            let s = (strength as f64 * 2.0).min(1.0);
            let t = s * s * (3.0 - 2.0 * s);
            height += (bed - height) * t;
        }

        let carving = match properties.carving {
            Carving::None => None,
            Carving::River => self.river_carving.extent(x, z),
            Carving::Lake => self.lake_carving.extent(x, z),
        };

        SurfaceColumn {
            height,
            variant,
            carving,
            flow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area_cache::FnSource;

    #[test]
    fn test_uniform_variant_matches_its_field() {
        let sampler = SurfaceSampler::new(1, 63);
        let plains = FnSource(|_: i32, _: i32| VariantKind::Plains);
        for i in -20..20 {
            let (x, z) = (i * 13, i * -7);
            let blended = sampler.blended_height(&plains, x, z);
            let direct = sampler.variant_height(VariantKind::Plains, x as f64 + 0.5, z as f64 + 0.5);
            assert!((blended - direct).abs() < 1e-9);
        }
    }

    #[test]
    fn test_blend_is_between_neighbours() {
        let sampler = SurfaceSampler::new(2, 63);
        let split = FnSource(|x: i32, _: i32| {
            if x < 0 {
                VariantKind::Ocean
            } else {
                VariantKind::Plateau
            }
        });
        for z in 0..16 {
            let h = sampler.blended_height(&split, 0, z);
            let ocean = sampler.variant_height(VariantKind::Ocean, 0.5, z as f64 + 0.5);
            let plateau = sampler.variant_height(VariantKind::Plateau, 0.5, z as f64 + 0.5);
            assert!(h > ocean && h < plateau, "{ocean} < {h} < {plateau}");
        }
    }

    #[test]
    fn test_river_variants_do_not_raise_neighbours() {
        let sampler = SurfaceSampler::new(3, 63);
        let mixed = FnSource(|x: i32, _: i32| {
            if x == 0 {
                VariantKind::River
            } else {
                VariantKind::Plains
            }
        });
        let h = sampler.blended_height(&mixed, 2, 2);
        let plains = sampler.variant_height(VariantKind::Plains, 2.5, 2.5);
        assert!((h - plains).abs() < 1e-9);
    }

    #[test]
    fn test_shared_fields_for_equal_parameters() {
        let sampler = SurfaceSampler::new(4, 63);
        for i in 0..20 {
            let (x, z) = (i as f64 * 31.0, i as f64 * 17.0);
            assert_eq!(
                sampler.variant_height(VariantKind::Mountains, x, z),
                sampler.variant_height(VariantKind::MountainRiver, x, z)
            );
        }
    }
}
