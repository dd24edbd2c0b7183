//! Per-plate river networks and their spatial index.
//!
//! A [`Watershed`] is the river system of one land plate: every ocean cell
//! bordering the plate is a candidate drain, rivers grow inland from the
//! drains that pass a random check, and each surviving edge becomes a
//! [`MidpointFractal`]. [`WatershedContext`] builds watersheds on demand and
//! buckets their fractals into partitions, so a point query only tests the
//! few fractals whose bounds reach its partition.

use std::f64::consts::{FRAC_PI_4, SQRT_2, TAU};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use glam::DVec2;
use loam_config::{Config, RiverSettings};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use super::fractal::{MidpointFractal, Nearest};
use super::network::{RiverNetwork, RiverParams};
use super::plate::{Plate, PlateLayer};
use super::{Flow, RIVER_WIDTH};
use crate::area_cache::{AreaSource, ConcurrentAreaCache};
use crate::seed::{derive_seed, det_cos, det_sin};
use crate::units::{PARTITION_BITS, ZOOM_BITS, block_to_grid_f64, pack};

/// Flood fills stop growing past this many cells.
pub const MAX_WATERSHED_CELLS: usize = 4096;

/// Distance from a drain to the interior cell its river must start in.
const SOURCE_REACH: f64 = 1.4;

/// Partition edge length in grid units.
const PARTITION_SIZE: f64 = 1.0 / (1 << (ZOOM_BITS - PARTITION_BITS)) as f64;

/// Bounds test radius around a partition center.
const PARTITION_RADIUS: f64 = PARTITION_SIZE * SQRT_2 / 2.0 + 2.0 * RIVER_WIDTH;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Rivers of one plate.
pub struct Watershed {
    plate: Plate,
    interior_cells: usize,
    drains: usize,
    rivers: Vec<Vec<Arc<MidpointFractal>>>,
}

impl Watershed {
    /// Build the watershed of the plate owning grid cell `(x, z)`.
    ///
    /// Oceanic plates have no rivers.
    pub fn build(
        plates: &impl AreaSource<Plate>,
        x: i32,
        z: i32,
        seed: u64,
        settings: &RiverSettings,
    ) -> Self {
        let plate = plates.sample(x, z);
        if plate.oceanic {
            return Self::empty(plate);
        }

        // Start from the cell holding the plate center when it belongs to the
        // plate, so every cell of the plate yields the same flood fill.
        let (cx, cz) = (plate.center_x.floor() as i32, plate.center_z.floor() as i32);
        let start = if plates.sample(cx, cz) == plate { (cx, cz) } else { (x, z) };

        let mut interior = FxHashSet::default();
        let mut drain_cells = FxHashSet::default();
        let mut stack = vec![start];
        interior.insert(pack(start.0, start.1));
        while let Some((px, pz)) = stack.pop() {
            for (dx, dz) in NEIGHBOURS {
                let (nx, nz) = (px + dx, pz + dz);
                let key = pack(nx, nz);
                if interior.contains(&key) || drain_cells.contains(&(nx, nz)) {
                    continue;
                }
                let neighbour = plates.sample(nx, nz);
                if neighbour == plate {
                    if interior.len() < MAX_WATERSHED_CELLS {
                        interior.insert(key);
                        stack.push((nx, nz));
                    }
                } else if neighbour.oceanic {
                    drain_cells.insert((nx, nz));
                }
            }
        }
        if interior.len() >= MAX_WATERSHED_CELLS {
            warn!(plate = plate.id, "watershed flood fill truncated at {MAX_WATERSHED_CELLS} cells");
        }

        let mut drains: Vec<(i32, i32)> = drain_cells.into_iter().collect();
        drains.sort_unstable();

        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ plate.id.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let params = RiverParams {
            length: settings.length as f64,
            depth: settings.depth,
            feather: settings.feather as f64,
        };
        let is_interior = |p: DVec2| interior.contains(&pack(p.x.floor() as i32, p.y.floor() as i32));

        let mut network = RiverNetwork::new();
        for &(dx, dz) in &drains {
            if !rng.random_bool(settings.source_chance.clamp(0.0, 1.0) as f64) {
                continue;
            }
            let drain = DVec2::new(dx as f64 + 0.5, dz as f64 + 0.5);
            let mut angle = rng.random::<f64>() * TAU;
            for _ in 0..8 {
                let start = drain + DVec2::new(det_cos(angle), det_sin(angle)) * SOURCE_REACH;
                if is_interior(start) {
                    network.add_river(drain, angle, params);
                    break;
                }
                angle += FRAC_PI_4;
            }
        }

        let roughness = settings.roughness as f64;
        let min_segment = settings.min_segment_length as f64;
        let rivers: Vec<Vec<Arc<MidpointFractal>>> = network
            .build(&mut rng, is_interior)
            .into_iter()
            .filter(|edges| !edges.is_empty())
            .map(|edges| {
                edges
                    .iter()
                    .map(|edge| {
                        Arc::new(MidpointFractal::new(
                            &mut rng,
                            edge.source.pos,
                            edge.drain.pos,
                            roughness,
                            min_segment,
                        ))
                    })
                    .collect()
            })
            .collect();

        debug!(
            plate = plate.id,
            cells = interior.len(),
            drains = drains.len(),
            rivers = rivers.len(),
            "built watershed"
        );
        Self {
            plate,
            interior_cells: interior.len(),
            drains: drains.len(),
            rivers,
        }
    }

    fn empty(plate: Plate) -> Self {
        Self {
            plate,
            interior_cells: 0,
            drains: 0,
            rivers: Vec::new(),
        }
    }

    pub fn plate(&self) -> Plate {
        self.plate
    }

    pub fn interior_cells(&self) -> usize {
        self.interior_cells
    }

    /// Number of ocean cells bordering the plate.
    pub fn drains(&self) -> usize {
        self.drains
    }

    /// River trees, each a list of edge fractals.
    pub fn rivers(&self) -> &[Vec<Arc<MidpointFractal>>] {
        &self.rivers
    }

    pub fn fractals(&self) -> impl Iterator<Item = &Arc<MidpointFractal>> {
        self.rivers.iter().flatten()
    }
}

type Memo<T> = DashMap<u64, Arc<OnceLock<T>>>;

/// Lazily built watersheds and partitions.
///
/// Each watershed and each partition is computed at most once, even when
/// many threads ask for it at the same time: the map only holds a cell, and
/// the cell's initializer runs outside the map's shard lock.
pub struct WatershedContext {
    plates: ConcurrentAreaCache<Plate, PlateLayer>,
    seed: u64,
    settings: RiverSettings,
    watersheds: Memo<Arc<Watershed>>,
    partitions: Memo<Arc<[Arc<MidpointFractal>]>>,
}

impl WatershedContext {
    pub fn new(config: &Config) -> Self {
        let layer = PlateLayer::new(config.world.seed, &config.rock_layers);
        Self {
            plates: ConcurrentAreaCache::new(layer, config.cache.plate_cache_bits),
            seed: derive_seed(config.world.seed, "rivers"),
            settings: config.rivers.clone(),
            watersheds: DashMap::new(),
            partitions: DashMap::new(),
        }
    }

    /// Plate owning grid cell `(x, z)`.
    #[inline]
    pub fn plate_at(&self, grid_x: i32, grid_z: i32) -> Plate {
        self.plates.get(grid_x, grid_z)
    }

    /// Watershed of the plate owning grid cell `(x, z)`.
    pub fn watershed(&self, grid_x: i32, grid_z: i32) -> Arc<Watershed> {
        let plate = self.plate_at(grid_x, grid_z);
        let cell = Arc::clone(self.watersheds.entry(plate.id).or_default().value());
        Arc::clone(cell.get_or_init(|| {
            Arc::new(Watershed::build(&self.plates, grid_x, grid_z, self.seed, &self.settings))
        }))
    }

    /// All fractals whose bounds reach partition `(px, pz)`, ordered by plate id.
    pub fn partition(&self, px: i32, pz: i32) -> Arc<[Arc<MidpointFractal>]> {
        let cell = Arc::clone(self.partitions.entry(pack(px, pz)).or_default().value());
        Arc::clone(cell.get_or_init(|| self.build_partition(px, pz)))
    }

    fn build_partition(&self, px: i32, pz: i32) -> Arc<[Arc<MidpointFractal>]> {
        let center_x = (px as f64 + 0.5) * PARTITION_SIZE;
        let center_z = (pz as f64 + 0.5) * PARTITION_SIZE;

        let mut cells: Vec<(u64, i32, i32)> = [(-0.5, -0.5), (-0.5, 0.5), (0.5, -0.5), (0.5, 0.5)]
            .into_iter()
            .map(|(ox, oz)| {
                let (gx, gz) = ((center_x + ox).floor() as i32, (center_z + oz).floor() as i32);
                (self.plate_at(gx, gz).id, gx, gz)
            })
            .collect();
        cells.sort_unstable();
        cells.dedup_by_key(|(id, _, _)| *id);

        let fractals: Arc<[Arc<MidpointFractal>]> = cells
            .into_iter()
            .flat_map(|(_, gx, gz)| {
                let watershed = self.watershed(gx, gz);
                watershed
                    .fractals()
                    .filter(|f| f.maybe_intersect(center_x, center_z, PARTITION_RADIUS))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        debug!(px, pz, fractals = fractals.len(), "built watershed partition");
        fractals
    }

    /// Fractals near a point in grid units.
    pub fn fractals_near(&self, grid_x: f64, grid_z: f64) -> Arc<[Arc<MidpointFractal>]> {
        let px = (grid_x / PARTITION_SIZE).floor() as i32;
        let pz = (grid_z / PARTITION_SIZE).floor() as i32;
        self.partition(px, pz)
    }

    /// Whether a river centerline passes within `width` of a point in grid units.
    pub fn intersect(&self, grid_x: f64, grid_z: f64, width: f64) -> bool {
        self.fractals_near(grid_x, grid_z)
            .iter()
            .any(|f| f.intersect(grid_x, grid_z, width))
    }

    /// Downstream flow at a block column.
    ///
    /// The nearest centerline within [`RIVER_WIDTH`] decides the direction;
    /// strength falls linearly from 1 on the centerline to 0 at the edge.
    pub fn flow_at(&self, block_x: i32, block_z: i32) -> Flow {
        let (gx, gz) = (
            block_to_grid_f64(block_x as f64 + 0.5),
            block_to_grid_f64(block_z as f64 + 0.5),
        );
        let mut best: Option<Nearest> = None;
        for fractal in self.fractals_near(gx, gz).iter() {
            if let Some(nearest) = fractal.nearest(gx, gz, RIVER_WIDTH)
                && best.is_none_or(|b| nearest.distance < b.distance)
            {
                best = Some(nearest);
            }
        }
        match best {
            Some(nearest) if nearest.distance < RIVER_WIDTH => Flow::Flowing {
                dx: nearest.tangent.x as f32,
                dz: nearest.tangent.y as f32,
                strength: (1.0 - nearest.distance / RIVER_WIDTH) as f32,
            },
            _ => Flow::None,
        }
    }

    /// Number of partitions built so far.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area_cache::FnSource;
    use crate::river::fractal::distance_to_segment_sq;
    use crate::units::GRID_BITS;

    fn plate(id: u64, oceanic: bool) -> Plate {
        Plate {
            id,
            oceanic,
            elevation: 0.5,
            center_x: 0.5,
            center_z: 0.5,
        }
    }

    /// A square island of side 24 cells centered on the origin.
    fn island() -> FnSource<impl Fn(i32, i32) -> Plate + Send + Sync> {
        FnSource(|x: i32, z: i32| {
            if x.abs() < 12 && z.abs() < 12 {
                plate(1, false)
            } else {
                plate(2, true)
            }
        })
    }

    fn settings() -> RiverSettings {
        RiverSettings {
            source_chance: 1.0,
            ..RiverSettings::default()
        }
    }

    #[test]
    fn test_island_grows_rivers_inside() {
        let shed = Watershed::build(&island(), 0, 0, 7, &settings());
        assert_eq!(shed.interior_cells(), 23 * 23);
        assert!(shed.drains() > 0);
        assert!(!shed.rivers().is_empty(), "a large island should have rivers");
        for fractal in shed.fractals() {
            let source = fractal.source();
            assert!(source.x.abs() < 12.5 && source.y.abs() < 12.5);
        }
    }

    #[test]
    fn test_ocean_plate_has_no_rivers() {
        let shed = Watershed::build(&island(), 40, 40, 7, &settings());
        assert_eq!(shed.interior_cells(), 0);
        assert!(shed.rivers().is_empty());
    }

    #[test]
    fn test_zero_source_chance_has_no_rivers() {
        let settings = RiverSettings {
            source_chance: 0.0,
            ..RiverSettings::default()
        };
        let shed = Watershed::build(&island(), 0, 0, 7, &settings);
        assert!(shed.rivers().is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = Watershed::build(&island(), 0, 0, 99, &settings());
        let b = Watershed::build(&island(), 3, -4, 99, &settings());
        let pa: Vec<_> = a.fractals().map(|f| f.points().to_vec()).collect();
        let pb: Vec<_> = b.fractals().map(|f| f.points().to_vec()).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_partition_contains_every_intersecting_fractal() {
        let context = WatershedContext::new(&Config::default());
        // Find a land cell with rivers near the origin.
        let mut found = None;
        'search: for gx in -40..40 {
            for gz in -40..40 {
                let shed = context.watershed(gx, gz);
                if let Some(fractal) = shed.fractals().next() {
                    found = Some((shed.plate(), Arc::clone(fractal)));
                    break 'search;
                }
            }
        }
        let Some((plate, fractal)) = found else {
            return;
        };
        for point in fractal.points() {
            if context.plate_at(point.x.floor() as i32, point.y.floor() as i32) != plate {
                continue;
            }
            let near = context.fractals_near(point.x, point.y);
            assert!(
                near.iter().any(|f| Arc::ptr_eq(f, &fractal)),
                "partition at {point:?} misses a fractal passing through it"
            );
            assert!(context.intersect(point.x, point.y, RIVER_WIDTH));
        }
    }

    #[test]
    fn test_partition_built_once_under_contention() {
        let context = Arc::new(WatershedContext::new(&Config::default()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let context = Arc::clone(&context);
                std::thread::spawn(move || context.partition(3, -2))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(result, &results[0]));
        }
        assert_eq!(context.partition_count(), 1);
    }

    /// First land watershed with rivers near the origin.
    fn river_fractal(context: &WatershedContext) -> Option<(Plate, Arc<MidpointFractal>)> {
        for gx in -40..40 {
            for gz in -40..40 {
                let shed = context.watershed(gx, gz);
                if let Some(fractal) = shed.fractals().next() {
                    return Some((shed.plate(), Arc::clone(fractal)));
                }
            }
        }
        None
    }

    fn block_of(grid: f64) -> i32 {
        (grid * (1 << GRID_BITS) as f64).floor() as i32
    }

    fn block_center(block: i32) -> f64 {
        block_to_grid_f64(block as f64 + 0.5)
    }

    #[test]
    fn test_flow_follows_centerline() {
        let mut config = Config::default();
        config.world.seed = 31;
        config.rivers.source_chance = 1.0;
        let context = WatershedContext::new(&config);
        let (plate, fractal) = river_fractal(&context).expect("seed 31 grows rivers");

        let mut on_river = 0;
        let mut beside_river = 0;
        for (a, b) in fractal.segments() {
            let mid = (a + b) * 0.5;
            if context.plate_at(mid.x.floor() as i32, mid.y.floor() as i32) != plate {
                continue;
            }
            let tangent = (b - a).normalize_or_zero();
            if tangent == DVec2::ZERO {
                continue;
            }

            let (bx, bz) = (block_of(mid.x), block_of(mid.y));
            let center = DVec2::new(block_center(bx), block_center(bz));
            let own = distance_to_segment_sq(a, b, center).sqrt();
            let Flow::Flowing { dx, dz, strength } = context.flow_at(bx, bz) else {
                panic!("no flow at the middle of segment {a:?}..{b:?}");
            };
            assert!(strength as f64 >= 1.0 - own / RIVER_WIDTH - 1e-5);
            assert!(strength > 0.85, "strength {strength} at {center:?}");
            let closer = context.fractals_near(center.x, center.y).iter().any(|f| {
                f.segments().any(|(c, d)| {
                    (c, d) != (a, b) && distance_to_segment_sq(c, d, center).sqrt() <= own + 1e-9
                })
            });
            if !closer {
                let dot = dx as f64 * tangent.x + dz as f64 * tangent.y;
                assert!(dot > 0.999, "flow ({dx}, {dz}) against segment {tangent:?}");
                on_river += 1;
            }

            let side = mid + tangent.perp() * (3.0 * RIVER_WIDTH);
            let (sx, sz) = (block_of(side.x), block_of(side.y));
            if !context.intersect(block_center(sx), block_center(sz), RIVER_WIDTH) {
                assert_eq!(context.flow_at(sx, sz), Flow::None);
                beside_river += 1;
            }
        }
        assert!(on_river > 0);
        assert!(beside_river > 0);
    }

    #[test]
    fn test_flow_without_nearby_fractals_is_none() {
        let context = WatershedContext::new(&Config::default());
        for gx in -30..30 {
            if context.fractals_near(gx as f64 + 0.5, 0.5).is_empty() {
                assert_eq!(context.flow_at((gx << 9) + 256, 256), Flow::None);
            }
        }
    }
}
