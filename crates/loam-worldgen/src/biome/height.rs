//! Height field construction for each [`HeightNoise`] family.
//!
//! All fields are sampled at block coordinates and return an absolute
//! surface Y. Each family draws from consecutive sub-seeds of one seed.

use std::sync::Arc;

use super::variant::{HeightNoise, VolcanoParams};
use crate::noise::{
    Cellular2D, CellularReturn, FnNoise2D, Noise2D, Noise2DExt, OpenSimplex2D, SharedNoise2D,
};

/// Volcano cell frequency in blocks.
const VOLCANO_FREQUENCY: f64 = 0.009;
/// F1 distance at which a volcano stops influencing the surface.
const VOLCANO_RADIUS: f64 = 0.23;
/// F1 distance of the caldera rim.
const CALDERA_RADIUS: f64 = 0.04;

#[inline]
fn simplex(seed: u64, offset: u64) -> OpenSimplex2D {
    OpenSimplex2D::new(seed.wrapping_add(offset))
}

impl HeightNoise {
    /// Build the height field for this family.
    pub fn build(self, seed: u64, sea_level: f64) -> SharedNoise2D {
        match self {
            HeightNoise::Ocean { min, max } => ocean(seed, sea_level, min, max),
            HeightNoise::OceanRidge { min, max } => ocean_ridge(seed, sea_level, min, max),
            HeightNoise::Hills { min, max } => simplex(seed, 0)
                .octaves(4, 0.5)
                .spread(0.05)
                .scaled(sea_level + min, sea_level + max)
                .shared(),
            HeightNoise::Lowlands => simplex(seed, 0)
                .octaves(6, 0.5)
                .spread(0.55)
                .scaled(sea_level - 6.0, sea_level + 7.0)
                .flattened(sea_level - 4.0, sea_level + 3.0)
                .shared(),
            HeightNoise::Canyons { min, max } => canyons(seed, sea_level, min, max),
            HeightNoise::Badlands => badlands(seed, sea_level, false),
            HeightNoise::InvertedBadlands => badlands(seed, sea_level, true),
            HeightNoise::Mountains { base, scale } => mountains(seed, sea_level, base, scale),
            HeightNoise::Shore => simplex(seed, 0)
                .octaves(4, 0.5)
                .spread(0.17)
                .scaled(sea_level, sea_level + 1.8)
                .shared(),
            HeightNoise::Lake => simplex(seed, 0)
                .octaves(4, 0.5)
                .spread(0.15)
                .scaled(sea_level - 12.0, sea_level - 2.0)
                .shared(),
            HeightNoise::River => simplex(seed, 0)
                .octaves(4, 0.5)
                .spread(0.2)
                .scaled(sea_level - 8.0, sea_level - 2.0)
                .shared(),
        }
    }
}

fn ocean(seed: u64, sea_level: f64, min: f64, max: f64) -> SharedNoise2D {
    let warp_x = simplex(seed, 0).octaves(2, 0.5).spread(0.015).scaled(-30.0, 30.0);
    let warp_z = simplex(seed, 1).octaves(2, 0.5).spread(0.015).scaled(-30.0, 30.0);
    simplex(seed, 2)
        .octaves(4, 0.5)
        .spread(0.11)
        .warped(warp_x, warp_z)
        .scaled(sea_level + min, sea_level + max)
        .shared()
}

fn ocean_ridge(seed: u64, sea_level: f64, min: f64, max: f64) -> SharedNoise2D {
    let warp_x = simplex(seed, 0).octaves(2, 0.5).spread(0.015).scaled(-30.0, 30.0);
    let warp_z = simplex(seed, 1).octaves(2, 0.5).spread(0.015).scaled(-30.0, 30.0);
    let ridge = simplex(seed, 1)
        .octaves(4, 0.5)
        .ridged()
        .spread(0.015)
        .map(|x| {
            if x > -0.3 {
                let t = (x + 0.3) / 1.3;
                -35.0 * t * t * t
            } else {
                0.0
            }
        });
    simplex(seed, 2)
        .octaves(4, 0.5)
        .spread(0.11)
        .scaled(sea_level + min, sea_level + max)
        .add(ridge)
        .warped(warp_x, warp_z)
        .shared()
}

fn canyons(seed: u64, sea_level: f64, min: f64, max: f64) -> SharedNoise2D {
    let warp_x = simplex(seed, 0).octaves(4, 0.5).spread(0.1).scaled(-30.0, 30.0);
    let warp_z = simplex(seed, 1).octaves(4, 0.5).spread(0.1).scaled(-30.0, 30.0);
    simplex(seed, 0)
        .octaves(4, 0.5)
        .spread(0.2)
        .warped(warp_x, warp_z)
        .map(|x| if x > 0.4 { x - 0.8 } else { -x })
        .scaled_from(-0.4, 0.8, sea_level + min, sea_level + max)
        .spread(0.3)
        .shared()
}

/// Flat tableland cut by terraced ridges. Inverted badlands raise the
/// terraces into spires instead of cutting them down.
fn badlands(seed: u64, sea_level: f64, inverted: bool) -> SharedNoise2D {
    let ridges = simplex(seed, 1)
        .octaves(4, 0.5)
        .ridged()
        .spread(0.04)
        .map(|x| 1.3 * -(if x > 0.0 { x * x * x } else { 0.5 * x }))
        .scaled_from(-1.0, 0.3, -1.0, 1.0)
        .terraces(15);
    if inverted {
        simplex(seed, 0)
            .octaves(4, 0.5)
            .spread(0.025)
            .scaled(sea_level + 12.0, sea_level + 22.0)
            .add(ridges.scaled(30.0, 0.0))
            .shared()
    } else {
        simplex(seed, 0)
            .octaves(4, 0.5)
            .spread(0.025)
            .scaled(sea_level + 22.0, sea_level + 32.0)
            .add(ridges.scaled(-19.5, 0.0))
            .map(move |x| if x < sea_level { sea_level - 0.3 * (sea_level - x) } else { x })
            .shared()
    }
}

fn mountains(seed: u64, sea_level: f64, base: f64, scale: f64) -> SharedNoise2D {
    let body = simplex(seed, 0)
        .octaves(6, 0.5)
        .spread(0.14)
        .add(
            simplex(seed, 1)
                .octaves(4, 0.5)
                .ridged()
                .spread(0.02)
                .scaled(-0.7, 0.7),
        )
        .map(|x| 0.125 * (x + 1.0).powi(3))
        .map(move |x| sea_level + base + scale * x);
    let cliff = simplex(seed, 2)
        .octaves(2, 0.5)
        .map(|x| x.max(0.0))
        .spread(0.01)
        .scaled(-25.0, 25.0);
    let cliff_height = simplex(seed, 3)
        .octaves(2, 0.5)
        .spread(0.01)
        .scaled(-20.0, 20.0);

    // Cliff layers are only sampled where the body could reach them.
    FnNoise2D(move |x: f64, z: f64| {
        let height = body.noise(x, z);
        if height > sea_level + 57.0 && height > sea_level + 77.0 + cliff_height.noise(x, z) {
            height + cliff.noise(x, z)
        } else {
            height
        }
    })
    .shared()
}

/// Volcano influence at an F1 distance: 1 at the center, 0 at [`VOLCANO_RADIUS`].
#[inline]
pub fn volcano_easing(distance: f64) -> f64 {
    let t = (1.0 - distance / VOLCANO_RADIUS).clamp(0.0, 1.0);
    t * t
}

/// Cone profile in `[0, 1]`: a caldera dip inside the rim, a concave flank outside.
#[inline]
pub fn volcano_profile(distance: f64) -> f64 {
    if distance < CALDERA_RADIUS {
        0.8 + 0.2 * (distance / CALDERA_RADIUS)
    } else {
        let t = (1.0 - (distance - CALDERA_RADIUS) / (VOLCANO_RADIUS - CALDERA_RADIUS)).max(0.0);
        t * t.sqrt()
    }
}

/// Overlay volcanoes on `base`.
///
/// One in `rarity` volcano cells holds a cone of height `scale_height`
/// rising from `base_height` above sea level, blended into the base surface
/// with [`volcano_easing`].
pub fn with_volcanoes(
    base: SharedNoise2D,
    seed: u64,
    params: VolcanoParams,
    sea_level: f64,
) -> SharedNoise2D {
    let cells = Cellular2D::new(seed.wrapping_add(0x7015))
        .with_frequency(VOLCANO_FREQUENCY)
        .returning(CellularReturn::F1);
    let jitter = simplex(seed, 0x7016)
        .octaves(2, 0.5)
        .spread(0.1)
        .scaled(-0.0123, 0.0123);
    let chance = 1.0 / params.rarity.max(1) as f64;

    Arc::new(FnNoise2D(move |x: f64, z: f64| {
        let cell = cells.cell(x, z);
        let base_height = base.noise(x, z);
        let t = volcano_easing(cell.f1);
        if cell.value < chance && t > 0.0 {
            let profile = volcano_profile(cell.f1 + jitter.noise(x, z));
            let height = sea_level + params.base_height + profile * params.scale_height;
            let blended = 0.5 * (height + height.max(base_height));
            base_height + (blended - base_height) * t
        } else {
            base_height
        }
    }))
}

/// Center line and half height of a carved underground water body.
pub struct CarvingNoise {
    pub center: SharedNoise2D,
    pub height: SharedNoise2D,
}

impl CarvingNoise {
    /// River tunnel: smooth center near sea level and a noisy roof.
    pub fn river(seed: u64, sea_level: f64) -> Self {
        Self {
            center: simplex(seed, 0)
                .octaves(2, 0.5)
                .spread(0.02)
                .scaled(sea_level - 3.0, sea_level + 3.0)
                .shared(),
            height: simplex(seed, 0)
                .octaves(4, 0.5)
                .spread(0.15)
                .scaled(8.0, 14.0)
                .shared(),
        }
    }

    /// Lake cavern: a river tunnel held up by cellular stone columns.
    pub fn lake(seed: u64, sea_level: f64) -> Self {
        const COLUMN_THRESHOLD: f64 = 0.5;
        let river = Self::river(seed, sea_level);
        let base = river.height;
        let columns = Cellular2D::new(seed.wrapping_add(1))
            .returning(CellularReturn::F1)
            .with_frequency(0.065);
        let height = FnNoise2D(move |x: f64, z: f64| {
            let mut max_height = 14.0;
            let column = columns.noise(x, z);
            if column < COLUMN_THRESHOLD {
                let t = (column - COLUMN_THRESHOLD) / (COLUMN_THRESHOLD - 0.1);
                max_height = 14.0 * (1.0 - t * t);
                if max_height < 0.0 {
                    return 0.0;
                }
            }
            base.noise(x, z).min(max_height)
        });
        Self {
            center: river.center,
            height: height.shared(),
        }
    }

    /// Vertical extent `(bottom, top)` of the carving at a column, if any.
    pub fn extent(&self, x: f64, z: f64) -> Option<(f64, f64)> {
        let half = self.height.noise(x, z) * 0.5;
        if half <= 0.0 {
            return None;
        }
        let center = self.center.noise(x, z);
        Some((center - half, center + half))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEA: f64 = 63.0;

    fn range_of(noise: &SharedNoise2D) -> (f64, f64) {
        let mut lo = f64::MAX;
        let mut hi = f64::MIN;
        for i in -200..200 {
            let h = noise.noise(i as f64 * 13.7, i as f64 * -7.3);
            lo = lo.min(h);
            hi = hi.max(h);
        }
        (lo, hi)
    }

    #[test]
    fn test_hills_stay_in_range() {
        let hills = HeightNoise::Hills { min: 4.0, max: 10.0 }.build(1, SEA);
        let (lo, hi) = range_of(&hills);
        // Octave sum of 4 layers at persistence 0.5 stays within 0.9375 of the unit range.
        assert!(lo >= SEA + 4.0 - 3.0 && hi <= SEA + 10.0 + 3.0, "{lo}..{hi}");
    }

    #[test]
    fn test_lowlands_are_flattened() {
        let lowlands = HeightNoise::Lowlands.build(2, SEA);
        let (lo, hi) = range_of(&lowlands);
        assert!(lo >= SEA - 4.0 && hi <= SEA + 3.0, "{lo}..{hi}");
    }

    #[test]
    fn test_ocean_is_below_sea_level() {
        let ocean = HeightNoise::Ocean { min: -26.0, max: -12.0 }.build(3, SEA);
        let (_, hi) = range_of(&ocean);
        assert!(hi < SEA, "ocean floor reached {hi}");
    }

    #[test]
    fn test_mountains_rise_above_base() {
        let mountains = HeightNoise::Mountains { base: 10.0, scale: 70.0 }.build(4, SEA);
        let (lo, hi) = range_of(&mountains);
        assert!(lo >= SEA + 10.0 - 25.0, "mountain floor {lo}");
        assert!(hi > lo + 10.0, "mountains should have relief: {lo}..{hi}");
    }

    #[test]
    fn test_badlands_floor_is_compressed() {
        let badlands = HeightNoise::Badlands.build(5, SEA);
        let (lo, _) = range_of(&badlands);
        assert!(lo >= SEA - 10.0, "badlands dropped to {lo}");
    }

    #[test]
    fn test_volcano_easing_and_profile() {
        assert_eq!(volcano_easing(0.0), 1.0);
        assert_eq!(volcano_easing(VOLCANO_RADIUS), 0.0);
        assert_eq!(volcano_easing(1.0), 0.0);
        assert!(volcano_profile(0.0) < volcano_profile(CALDERA_RADIUS));
        assert_eq!(volcano_profile(VOLCANO_RADIUS), 0.0);
    }

    #[test]
    fn test_volcanoes_never_lower_far_terrain() {
        let base: SharedNoise2D = Arc::new(FnNoise2D(|_: f64, _: f64| SEA + 20.0));
        let params = VolcanoParams {
            rarity: 1,
            base_height: 25.0,
            scale_height: 50.0,
        };
        let volcanic = with_volcanoes(base, 9, params, SEA);
        let mut raised = 0;
        for i in 0..400 {
            let h = volcanic.noise(i as f64 * 5.0, i as f64 * 3.0);
            assert!(h >= SEA + 20.0 - 1e-9, "volcano lowered terrain to {h}");
            if h > SEA + 20.5 {
                raised += 1;
            }
        }
        assert!(raised > 0, "rarity 1 should place volcanoes");
    }

    #[test]
    fn test_lake_carving_has_columns() {
        let carving = CarvingNoise::lake(11, SEA);
        let mut solid = 0;
        for i in 0..2000 {
            let (x, z) = (i as f64 * 0.9, i as f64 * 0.37);
            match carving.extent(x, z) {
                Some((bottom, top)) => assert!(bottom < top),
                None => solid += 1,
            }
        }
        assert!(solid > 0, "expected at least one column");
    }
}
