//! Trilinear interpolation of a density function over coarse cells.
//!
//! The source is evaluated only at cell corners. Two X planes of corners are
//! kept: `slice0` at the current cell's low X and `slice1` at its high X.
//! Every voxel inside a cell is then three nested lerps over the eight
//! corners of that cell.
//!
//! Calls must follow a fixed order:
//!
//! 1. [`initialize_for_first_cell_x`](TrilinearInterpolator::initialize_for_first_cell_x)
//! 2. per X cell: [`advance_cell_x`](TrilinearInterpolator::advance_cell_x)
//! 3. per cell in the plane: [`select_cell_yz`](TrilinearInterpolator::select_cell_yz)
//! 4. per voxel: `update_for_y`, `update_for_x`, `update_for_z`, `sample`
//! 5. end of the X cell: [`swap_slices`](TrilinearInterpolator::swap_slices)
//!
//! Out of order calls panic. [`super::cursor`] wraps a set of interpolators
//! in types that only expose the next legal step.

use super::settings::ChunkNoiseSamplingSettings;
use crate::noise::Noise3D;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Fresh,
    Initialized,
    Advanced,
    CellSelected,
    YUpdated,
    XUpdated,
    ZUpdated,
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Per-chunk, per-channel interpolation state. Not reentrant.
pub struct TrilinearInterpolator<'a> {
    source: &'a dyn Noise3D,
    settings: ChunkNoiseSamplingSettings,
    slice0: Box<[f64]>,
    slice1: Box<[f64]>,
    cell_x: i32,
    /// Indexed by `x << 2 | y << 1 | z` within the cell.
    corners: [f64; 8],
    /// After Y: `x << 1 | z`.
    y_edges: [f64; 4],
    /// After X: indexed by z.
    x_edges: [f64; 2],
    value: f64,
    phase: Phase,
}

impl<'a> TrilinearInterpolator<'a> {
    pub fn new(settings: ChunkNoiseSamplingSettings, source: &'a dyn Noise3D) -> Self {
        let len = settings.plane_len();
        Self {
            source,
            settings,
            slice0: vec![0.0; len].into_boxed_slice(),
            slice1: vec![0.0; len].into_boxed_slice(),
            cell_x: 0,
            corners: [0.0; 8],
            y_edges: [0.0; 4],
            x_edges: [0.0; 2],
            value: 0.0,
            phase: Phase::Fresh,
        }
    }

    fn fill_slice(
        source: &dyn Noise3D,
        settings: &ChunkNoiseSamplingSettings,
        slice: &mut [f64],
        cell_x: i32,
    ) {
        for cell_z in 0..=settings.cell_count_xz {
            for cell_y in 0..=settings.cell_count_y {
                let (x, y, z) = settings.corner(cell_x, cell_y, cell_z);
                slice[settings.plane_index(cell_y, cell_z)] =
                    source.noise(x as f64, y as f64, z as f64);
            }
        }
    }

    /// Sample every corner of the first X plane into `slice0`.
    pub fn initialize_for_first_cell_x(&mut self) {
        assert_eq!(self.phase, Phase::Fresh, "interpolator already initialized");
        Self::fill_slice(self.source, &self.settings, &mut self.slice0, 0);
        self.phase = Phase::Initialized;
    }

    /// Sample the high X plane of cell `cell_x` into `slice1`.
    pub fn advance_cell_x(&mut self, cell_x: i32) {
        assert_eq!(
            self.phase,
            Phase::Initialized,
            "advance_cell_x needs an initialized interpolator with swapped slices"
        );
        Self::fill_slice(self.source, &self.settings, &mut self.slice1, cell_x + 1);
        self.cell_x = cell_x;
        self.phase = Phase::Advanced;
    }

    /// Load the eight corners of one cell in the current X plane pair.
    pub fn select_cell_yz(&mut self, cell_y: i32, cell_z: i32) {
        assert!(self.phase >= Phase::Advanced, "select_cell_yz before advance_cell_x");
        assert!(
            (0..self.settings.cell_count_y).contains(&cell_y),
            "cell_y {cell_y} out of range"
        );
        assert!(
            (0..self.settings.cell_count_xz).contains(&cell_z),
            "cell_z {cell_z} out of range"
        );
        for dy in 0..2 {
            for dz in 0..2 {
                let index = self.settings.plane_index(cell_y + dy, cell_z + dz);
                let corner = (dy << 1 | dz) as usize;
                self.corners[corner] = self.slice0[index];
                self.corners[4 | corner] = self.slice1[index];
            }
        }
        self.phase = Phase::CellSelected;
    }

    /// Collapse the Y axis at fraction `delta` of the cell height.
    #[inline]
    pub fn update_for_y(&mut self, delta: f64) {
        assert!(self.phase >= Phase::CellSelected, "update_for_y before select_cell_yz");
        let c = &self.corners;
        self.y_edges = [
            lerp(delta, c[0b000], c[0b010]),
            lerp(delta, c[0b001], c[0b011]),
            lerp(delta, c[0b100], c[0b110]),
            lerp(delta, c[0b101], c[0b111]),
        ];
        self.phase = Phase::YUpdated;
    }

    #[inline]
    pub fn update_for_x(&mut self, delta: f64) {
        assert!(self.phase >= Phase::YUpdated, "update_for_x before update_for_y");
        let e = &self.y_edges;
        self.x_edges = [lerp(delta, e[0b00], e[0b10]), lerp(delta, e[0b01], e[0b11])];
        self.phase = Phase::XUpdated;
    }

    #[inline]
    pub fn update_for_z(&mut self, delta: f64) {
        assert!(self.phase >= Phase::XUpdated, "update_for_z before update_for_x");
        self.value = lerp(delta, self.x_edges[0], self.x_edges[1]);
        self.phase = Phase::ZUpdated;
    }

    /// The fully interpolated value at the current voxel.
    #[inline]
    pub fn sample(&self) -> f64 {
        assert_eq!(self.phase, Phase::ZUpdated, "sample before update_for_z");
        self.value
    }

    /// The high X plane becomes the low X plane of the next cell.
    pub fn swap_slices(&mut self) {
        assert!(self.phase >= Phase::Advanced, "swap_slices before advance_cell_x");
        std::mem::swap(&mut self.slice0, &mut self.slice1);
        self.phase = Phase::Initialized;
    }

    /// Cell X of the current plane pair.
    pub fn cell_x(&self) -> i32 {
        self.cell_x
    }
}
