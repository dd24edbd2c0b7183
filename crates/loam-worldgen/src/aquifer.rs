//! Aquifer evaluation: what fills the open space in a chunk.
//!
//! Aquifer centers sit on a jittered 16x12x16 block grid. Each open voxel
//! takes the fluid of its nearest center. Where two nearby centers disagree
//! on fluid level or type, the barrier noise raises the density so a wall of
//! stone separates them.

use hashbrown::HashMap;
use rand::Rng;

use crate::noise::Noise3D;
use crate::sampler::{AquiferNoises, ChunkNoiseSamplingSettings};
use crate::seed::positional_rng;
use crate::units::{ChunkPos, pack};

const X_SPACING: i32 = 16;
const Y_SPACING: i32 = 12;
const Z_SPACING: i32 = 16;

const X_RANGE: i32 = 10;
const Y_RANGE: i32 = 9;
const Z_RANGE: i32 = 10;

/// Terrain density at which a voxel is so far above the surface that only
/// the global fluid level matters.
pub const OPEN_AIR_DENSITY: f64 = -8.0;

/// Layers above `min_y` that are flooded with lava.
const LAVA_LEVEL_HEIGHT: i32 = 10;
/// Local aquifers whose level is below `min_y + LAVA_AQUIFER_HEIGHT` may hold lava.
const LAVA_AQUIFER_HEIGHT: i32 = 54;
/// Fluid level of aquifers that are dry.
const WAY_BELOW_MIN_Y: i32 = -(1 << 20);

/// Chunk offsets whose surface bounds a local fluid level.
const SURFACE_SAMPLING_OFFSETS: [(i32, i32); 13] = [
    (-2, -1),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-3, 0),
    (-2, 0),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-2, 1),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// What a voxel is filled with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Substance {
    #[default]
    Air,
    Solid,
    Water,
    Lava,
}

impl Substance {
    #[inline]
    pub fn is_fluid(self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }
}

/// 1 for equal squared distances, falling off as they diverge.
#[inline]
fn similarity(first: i32, second: i32) -> f64 {
    1.0 - (second - first).abs() as f64 / 25.0
}

const FLOWING_UPDATE_SIMILARITY: f64 = 1.0 - (12 * 12 - 10 * 10) as f64 / 25.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FluidStatus {
    level: i32,
    fluid: Substance,
}

impl FluidStatus {
    #[inline]
    fn at(self, y: i32) -> Substance {
        if y < self.level {
            self.fluid
        } else {
            Substance::Air
        }
    }
}

/// Per-chunk aquifer state. Memoises aquifer centers, their fluid status
/// and surface estimates for the lifetime of one chunk fill.
pub struct NoiseBasedAquifer<'a, S> {
    noises: &'a AquiferNoises,
    surface: S,
    min_y: i32,
    min_grid: (i32, i32, i32),
    grid_size: (i32, i32, i32),
    centers: Vec<Option<(i32, i32, i32)>>,
    statuses: Vec<Option<FluidStatus>>,
    surface_memo: HashMap<u64, i32>,
    lava_level: FluidStatus,
    sea_level: FluidStatus,
    schedule_fluid_update: bool,
}

impl<'a, S: Fn(i32, i32) -> i32> NoiseBasedAquifer<'a, S> {
    /// `surface` estimates the terrain height at a block column. It is only
    /// called at chunk resolution and memoised.
    pub fn new(
        noises: &'a AquiferNoises,
        settings: &ChunkNoiseSamplingSettings,
        chunk: ChunkPos,
        sea_level: i32,
        surface: S,
    ) -> Self {
        let (min_x, min_z) = (chunk.min_block_x(), chunk.min_block_z());
        let min_grid = (
            min_x.div_euclid(X_SPACING) - 1,
            settings.min_y.div_euclid(Y_SPACING) - 1,
            min_z.div_euclid(Z_SPACING) - 1,
        );
        let max_grid = (
            (min_x + 15).div_euclid(X_SPACING) + 1,
            settings.max_y().div_euclid(Y_SPACING) + 1,
            (min_z + 15).div_euclid(Z_SPACING) + 1,
        );
        let grid_size = (
            max_grid.0 - min_grid.0 + 1,
            max_grid.1 - min_grid.1 + 1,
            max_grid.2 - min_grid.2 + 1,
        );
        let len = (grid_size.0 * grid_size.1 * grid_size.2) as usize;
        Self {
            noises,
            surface,
            min_y: settings.min_y,
            min_grid,
            grid_size,
            centers: vec![None; len],
            statuses: vec![None; len],
            surface_memo: HashMap::new(),
            lava_level: FluidStatus {
                level: settings.min_y + LAVA_LEVEL_HEIGHT,
                fluid: Substance::Lava,
            },
            sea_level: FluidStatus {
                level: sea_level,
                fluid: Substance::Water,
            },
            schedule_fluid_update: false,
        }
    }

    /// Whether the last voxel returned by [`compute_substance`](Self::compute_substance)
    /// sits where two aquifers meet and its fluid should be updated once placed.
    pub fn should_schedule_fluid_update(&self) -> bool {
        self.schedule_fluid_update
    }

    /// Fluid filling open space at `y` when no local aquifer applies.
    #[inline]
    pub fn global_fluid(&self, y: i32) -> Substance {
        self.global_status(y).at(y)
    }

    #[inline]
    fn global_status(&self, y: i32) -> FluidStatus {
        if y < self.min_y + LAVA_LEVEL_HEIGHT {
            self.lava_level
        } else {
            self.sea_level
        }
    }

    /// Resolve a voxel.
    ///
    /// `terrain` is the raw terrain density before caves, `density` the final
    /// density with caves, and `barrier` the interpolated barrier noise.
    /// Positive density is solid.
    pub fn compute_substance(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        terrain: f64,
        density: f64,
        barrier: f64,
    ) -> Substance {
        self.schedule_fluid_update = false;
        if terrain <= OPEN_AIR_DENSITY {
            return self.global_fluid(y);
        }
        if density > 0.0 {
            return Substance::Solid;
        }

        if self.global_fluid(y) == Substance::Lava {
            return Substance::Lava;
        }

        let cx = (x - 5).div_euclid(X_SPACING);
        let cy = (y + 1).div_euclid(Y_SPACING);
        let cz = (z - 5).div_euclid(Z_SPACING);

        let mut closest = [(i32::MAX, (0, 0, 0)); 3];
        for ox in 0..=1 {
            for oy in -1..=1 {
                for oz in 0..=1 {
                    let center = self.center(cx + ox, cy + oy, cz + oz);
                    let (dx, dy, dz) = (center.0 - x, center.1 - y, center.2 - z);
                    let distance = dx * dx + dy * dy + dz * dz;
                    if distance <= closest[0].0 {
                        closest[2] = closest[1];
                        closest[1] = closest[0];
                        closest[0] = (distance, center);
                    } else if distance <= closest[1].0 {
                        closest[2] = closest[1];
                        closest[1] = (distance, center);
                    } else if distance <= closest[2].0 {
                        closest[2] = (distance, center);
                    }
                }
            }
        }

        let status1 = self.status(closest[0].1);
        let status2 = self.status(closest[1].1);
        let status3 = self.status(closest[2].1);
        let similarity12 = similarity(closest[0].0, closest[1].0);
        let similarity13 = similarity(closest[0].0, closest[2].0);
        let similarity23 = similarity(closest[1].0, closest[2].0);

        let contribution = if status1.at(y) == Substance::Water
            && self.global_fluid(y - 1) == Substance::Lava
        {
            1.0
        } else if similarity12 > -1.0 {
            let pressure12 = pressure(y, barrier, status1, status2);
            let pressure13 = pressure(y, barrier, status1, status3);
            let pressure23 = pressure(y, barrier, status2, status3);
            let s12 = similarity12.max(0.0);
            let s13 = similarity13.max(0.0);
            let s23 = similarity23.max(0.0);
            (2.0 * s12 * pressure12.max((pressure13 * s13).max(pressure23 * s23))).max(0.0)
        } else {
            0.0
        };

        if density + contribution > 0.0 {
            return Substance::Solid;
        }
        let substance = status1.at(y);
        self.schedule_fluid_update = similarity12 >= FLOWING_UPDATE_SIMILARITY;
        substance
    }

    fn slot(&self, gx: i32, gy: i32, gz: i32) -> Option<usize> {
        let (dx, dy, dz) = (gx - self.min_grid.0, gy - self.min_grid.1, gz - self.min_grid.2);
        let (sx, sy, sz) = self.grid_size;
        if (0..sx).contains(&dx) && (0..sy).contains(&dy) && (0..sz).contains(&dz) {
            Some(((dy * sz + dz) * sx + dx) as usize)
        } else {
            None
        }
    }

    /// Jittered aquifer center of a grid cell.
    fn center(&mut self, gx: i32, gy: i32, gz: i32) -> (i32, i32, i32) {
        let slot = self.slot(gx, gy, gz);
        if let Some(center) = slot.and_then(|i| self.centers[i]) {
            return center;
        }
        let mut rng = positional_rng(self.noises.center_seed, gx, gy, gz);
        let center = (
            gx * X_SPACING + rng.random_range(0..X_RANGE),
            gy * Y_SPACING + rng.random_range(0..Y_RANGE),
            gz * Z_SPACING + rng.random_range(0..Z_RANGE),
        );
        if let Some(i) = slot {
            self.centers[i] = Some(center);
        }
        center
    }

    fn status(&mut self, center: (i32, i32, i32)) -> FluidStatus {
        let slot = self.slot(
            center.0.div_euclid(X_SPACING),
            center.1.div_euclid(Y_SPACING),
            center.2.div_euclid(Z_SPACING),
        );
        if let Some(status) = slot.and_then(|i| self.statuses[i]) {
            return status;
        }
        let status = self.compute_fluid(center.0, center.1, center.2);
        if let Some(i) = slot {
            self.statuses[i] = Some(status);
        }
        status
    }

    fn surface_at(&mut self, x: i32, z: i32) -> i32 {
        let key = pack(x.div_euclid(16), z.div_euclid(16));
        if let Some(&height) = self.surface_memo.get(&key) {
            return height;
        }
        let height = (self.surface)(x.div_euclid(16) * 16 + 8, z.div_euclid(16) * 16 + 8);
        self.surface_memo.insert(key, height);
        height
    }

    fn compute_fluid(&mut self, x: i32, y: i32, z: i32) -> FluidStatus {
        let global = self.global_status(y);
        let mut min_surface = i32::MAX;
        let mut under_sea_level = false;

        for (ox, oz) in SURFACE_SAMPLING_OFFSETS {
            let surface = self.surface_at(x + ox * 16, z + oz * 16);
            let max_surface = surface + 8;
            let at_target = ox == 0 && oz == 0;
            if at_target && y - 12 > max_surface {
                return global;
            }
            let reaches = y + 12 > max_surface;
            if reaches || at_target {
                let status = self.global_status(max_surface);
                if status.at(max_surface) != Substance::Air {
                    if at_target {
                        under_sea_level = true;
                    }
                    if reaches {
                        return status;
                    }
                }
            }
            min_surface = min_surface.min(surface);
        }

        let near_surface = if under_sea_level {
            clamped_map((min_surface + 8 - y) as f64, 0.0, 64.0, 1.0, 0.0)
        } else {
            0.0
        };
        let floodedness = self
            .noises
            .floodedness
            .noise(x as f64, y as f64, z as f64)
            .clamp(-1.0, 1.0);
        if floodedness > map(near_surface, 1.0, 0.0, -0.3, 0.8) {
            return global;
        }
        if floodedness <= map(near_surface, 1.0, 0.0, -0.8, 0.4) {
            return FluidStatus {
                level: WAY_BELOW_MIN_Y,
                fluid: global.fluid,
            };
        }

        let (gx, gy, gz) = (x.div_euclid(16), y.div_euclid(40), z.div_euclid(16));
        let center_y = gy * 40 + 20;
        let spread = self.noises.spread.noise(gx as f64, gy as f64, gz as f64) * 10.0;
        let level = center_y + (spread / 3.0).floor() as i32 * 3;
        FluidStatus {
            level: min_surface.min(level),
            fluid: self.fluid_type(x, y, z, global, level),
        }
    }

    fn fluid_type(&self, x: i32, y: i32, z: i32, global: FluidStatus, level: i32) -> Substance {
        if level <= self.min_y + LAVA_AQUIFER_HEIGHT {
            let lava = self.noises.lava.noise(
                x.div_euclid(64) as f64,
                y.div_euclid(40) as f64,
                z.div_euclid(64) as f64,
            );
            if lava.abs() > 0.3 {
                return Substance::Lava;
            }
        }
        global.fluid
    }
}

fn pressure(y: i32, barrier: f64, left: FluidStatus, right: FluidStatus) -> f64 {
    let (a, b) = (left.at(y), right.at(y));
    if matches!(
        (a, b),
        (Substance::Lava, Substance::Water) | (Substance::Water, Substance::Lava)
    ) {
        return 1.0;
    }
    let delta_level = (left.level as i64 - right.level as i64).abs() as f64;
    if delta_level == 0.0 {
        return 0.0;
    }
    let average = 0.5 * (left.level as f64 + right.level as f64);
    let above_average = y as f64 + 0.5 - average;
    let near_average = 0.5 * delta_level - above_average.abs();
    let pressure = if above_average > 0.0 {
        near_average / if near_average > 0.0 { 1.5 } else { 2.5 }
    } else {
        (near_average + 3.0) / if near_average > -3.0 { 3.0 } else { 10.0 }
    };
    if !(-2.0..=2.0).contains(&pressure) {
        return pressure;
    }
    barrier + pressure
}

#[inline]
fn map(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    to_min + (value - from_min) / (from_max - from_min) * (to_max - to_min)
}

#[inline]
fn clamped_map(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    let t = ((value - from_min) / (from_max - from_min)).clamp(0.0, 1.0);
    to_min + t * (to_max - to_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::NoiseSampler;

    fn aquifer<'a>(
        noises: &'a AquiferNoises,
        surface: i32,
    ) -> NoiseBasedAquifer<'a, impl Fn(i32, i32) -> i32> {
        let settings = ChunkNoiseSamplingSettings::new(-64, 384, 4, 8).unwrap();
        NoiseBasedAquifer::new(noises, &settings, ChunkPos::new(0, 0), 63, move |_, _| surface)
    }

    #[test]
    fn test_solid_density_stays_solid() {
        let sampler = NoiseSampler::new(1);
        let mut aquifer = aquifer(sampler.aquifer(), 80);
        for y in -60..100 {
            assert_eq!(aquifer.compute_substance(3, y, 7, 0.5, 0.5, 0.0), Substance::Solid);
        }
    }

    #[test]
    fn test_open_air_uses_global_levels() {
        let sampler = NoiseSampler::new(2);
        let mut aquifer = aquifer(sampler.aquifer(), 80);
        assert_eq!(aquifer.compute_substance(0, -60, 0, -10.0, -1.0, 0.0), Substance::Lava);
        assert_eq!(aquifer.compute_substance(0, 40, 0, -10.0, -1.0, 0.0), Substance::Water);
        assert_eq!(aquifer.compute_substance(0, 63, 0, -10.0, -1.0, 0.0), Substance::Air);
        assert_eq!(aquifer.compute_substance(0, 200, 0, -10.0, -1.0, 0.0), Substance::Air);
    }

    #[test]
    fn test_lava_below_lava_level() {
        let sampler = NoiseSampler::new(3);
        let mut aquifer = aquifer(sampler.aquifer(), 80);
        for y in -64..-54 {
            assert_eq!(aquifer.compute_substance(5, y, 5, 0.0, -0.5, 0.0), Substance::Lava);
        }
    }

    #[test]
    fn test_ocean_floor_caves_hold_sea_water() {
        // Surface far below sea level: every open voxel near it is under the ocean.
        let sampler = NoiseSampler::new(4);
        let mut aquifer = aquifer(sampler.aquifer(), 20);
        for y in 50..63 {
            assert_eq!(aquifer.compute_substance(8, y, 8, -1.0, -1.0, 0.0), Substance::Water);
        }
    }

    #[test]
    fn test_open_space_above_surface_is_air() {
        let sampler = NoiseSampler::new(5);
        let mut aquifer = aquifer(sampler.aquifer(), 80);
        for y in 110..200 {
            assert_eq!(aquifer.compute_substance(8, y, 8, -1.0, -1.0, 0.0), Substance::Air);
        }
    }

    #[test]
    fn test_is_deterministic() {
        let sampler = NoiseSampler::new(6);
        let mut a = aquifer(sampler.aquifer(), 70);
        let mut b = aquifer(sampler.aquifer(), 70);
        for y in -50..60 {
            for x in 0..16 {
                let barrier = (x as f64 * 0.1).sin();
                assert_eq!(
                    a.compute_substance(x, y, 15 - x, -0.3, -0.3, barrier),
                    b.compute_substance(x, y, 15 - x, -0.3, -0.3, barrier)
                );
            }
        }
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity(100, 100), 1.0);
        assert!(similarity(100, 125) < 0.01);
        assert!(FLOWING_UPDATE_SIMILARITY < 0.0);
    }
}
