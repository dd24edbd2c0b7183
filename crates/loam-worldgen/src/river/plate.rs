//! Tectonic plates on the watershed grid.
//!
//! Each grid cell belongs to the plate whose cellular feature point is
//! nearest to the cell center. Whether a plate is oceanic is decided by a
//! low frequency continent field sampled at the plate center, so land and
//! ocean plates clump into continents.

use std::hash::{Hash, Hasher};

use loam_config::RockLayerSettings;

use crate::area_cache::AreaSource;
use crate::noise::{Cellular2D, Noise2D, Noise2DExt, OpenSimplex2D, SharedNoise2D};
use crate::seed::{derive_seed, mix, unit_f64};
use crate::units::pack;

/// Cellular frequency of plate feature points, in grid units.
const PLATE_FREQUENCY: f64 = 0.08;

/// One plate. Two plates are equal when they have the same id.
#[derive(Clone, Copy, Debug)]
pub struct Plate {
    /// Packed lattice coordinate of the plate's cellular cell.
    pub id: u64,
    pub oceanic: bool,
    /// Per-plate random value in `[0, 1)`, used for terrain selection.
    pub elevation: f32,
    pub center_x: f64,
    pub center_z: f64,
}

impl PartialEq for Plate {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Plate {}

impl Hash for Plate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Grid cell `(x, z)` to the plate that owns it.
pub struct PlateLayer {
    cells: Cellular2D,
    continents: SharedNoise2D,
    elevation_seed: u64,
    ocean_threshold: f64,
}

impl PlateLayer {
    pub fn new(world_seed: i64, rock_layers: &RockLayerSettings) -> Self {
        let cells =
            Cellular2D::new(derive_seed(world_seed, "plates/cells")).with_frequency(PLATE_FREQUENCY);
        let octaves =
            OpenSimplex2D::new(derive_seed(world_seed, "plates/continents")).octaves(2, 0.5);
        let bound = octaves.amplitude_bound();
        let continents = octaves.spread(0.03).shared();
        // The continent field is symmetric around zero within `±bound`.
        let ocean_fraction = (rock_layers.ocean_percent.min(100) as f64) / 100.0;
        let ocean_threshold = (ocean_fraction * 2.0 - 1.0) * (bound + f64::EPSILON);
        Self {
            cells,
            continents,
            elevation_seed: derive_seed(world_seed, "plates/elevation"),
            ocean_threshold,
        }
    }

    pub fn plate_at(&self, grid_x: i32, grid_z: i32) -> Plate {
        let cell = self.cells.cell(grid_x as f64 + 0.5, grid_z as f64 + 0.5);
        let continent = self.continents.noise(cell.center_x, cell.center_z);
        Plate {
            id: pack(cell.cell_x, cell.cell_z),
            oceanic: continent < self.ocean_threshold,
            elevation: unit_f64(mix(self.elevation_seed, cell.cell_x, 0, cell.cell_z)) as f32,
            center_x: cell.center_x,
            center_z: cell.center_z,
        }
    }
}

impl AreaSource<Plate> for PlateLayer {
    #[inline]
    fn sample(&self, x: i32, z: i32) -> Plate {
        self.plate_at(x, z)
    }
}
