//! Cellular (Worley) noise.
//!
//! Space is divided into unit cells, each holding one jittered feature point.
//! [`Cellular2D::cell`] and [`Cellular3D::cell`] return everything known about
//! the nearest feature point in one value, including its center, so a single
//! instance can be sampled from any number of threads at once.
//!
//! When used through `Noise2D`/`Noise3D`, the returned channel is picked with
//! [`CellularReturn`]. Distances are in `[0, ~1.5]`, `Value` is in `[0, 1)`.

use super::{Noise2D, Noise3D};
use crate::seed::{mix, unit_f64};

/// Which channel `noise()` returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CellularReturn {
    /// Distance to the nearest feature point.
    #[default]
    F1,
    /// Distance to the second nearest feature point.
    F2,
    /// `F2 - F1`. Zero along cell borders.
    Distance,
    /// Per-cell random value of the nearest cell.
    Value,
}

/// Result of a 2D cellular query, in the caller's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell2D {
    pub f1: f64,
    pub f2: f64,
    pub value: f64,
    pub center_x: f64,
    pub center_z: f64,
    /// Lattice coordinates of the nearest cell.
    pub cell_x: i32,
    pub cell_z: i32,
}

/// Result of a 3D cellular query, in the caller's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell3D {
    pub f1: f64,
    pub f2: f64,
    pub value: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub center_z: f64,
    pub cell_x: i32,
    pub cell_y: i32,
    pub cell_z: i32,
}

impl Cell2D {
    pub fn get(&self, channel: CellularReturn) -> f64 {
        match channel {
            CellularReturn::F1 => self.f1,
            CellularReturn::F2 => self.f2,
            CellularReturn::Distance => self.f2 - self.f1,
            CellularReturn::Value => self.value,
        }
    }
}

impl Cell3D {
    pub fn get(&self, channel: CellularReturn) -> f64 {
        match channel {
            CellularReturn::F1 => self.f1,
            CellularReturn::F2 => self.f2,
            CellularReturn::Distance => self.f2 - self.f1,
            CellularReturn::Value => self.value,
        }
    }
}

const DEFAULT_JITTER: f64 = 0.9;

// Salts for the independent per-cell hashes.
const SALT_X: u64 = 0x51A7_0001;
const SALT_Y: u64 = 0x51A7_0002;
const SALT_Z: u64 = 0x51A7_0003;
const SALT_VALUE: u64 = 0x51A7_0004;

#[inline]
fn offset(seed: u64, salt: u64, x: i32, y: i32, z: i32, jitter: f64) -> f64 {
    0.5 + (unit_f64(mix(seed ^ salt, x, y, z)) - 0.5) * jitter
}

/// 2D cellular noise.
#[derive(Clone, Debug)]
pub struct Cellular2D {
    seed: u64,
    frequency: f64,
    jitter: f64,
    channel: CellularReturn,
}

impl Cellular2D {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            frequency: 1.0,
            jitter: DEFAULT_JITTER,
            channel: CellularReturn::F1,
        }
    }

    /// Cells per unit of input. Smaller values give larger cells.
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Feature point displacement inside a cell, `0` (grid) to `1`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn returning(mut self, channel: CellularReturn) -> Self {
        self.channel = channel;
        self
    }

    /// Nearest and second nearest feature points to `(x, z)`.
    pub fn cell(&self, x: f64, z: f64) -> Cell2D {
        let (px, pz) = (x * self.frequency, z * self.frequency);
        let (ix, iz) = (px.floor() as i32, pz.floor() as i32);

        let mut d1 = f64::MAX;
        let mut d2 = f64::MAX;
        let mut nearest = (0, 0, 0.0, 0.0);
        for cx in ix - 1..=ix + 1 {
            for cz in iz - 1..=iz + 1 {
                let fx = cx as f64 + offset(self.seed, SALT_X, cx, 0, cz, self.jitter);
                let fz = cz as f64 + offset(self.seed, SALT_Z, cx, 0, cz, self.jitter);
                let d = (fx - px) * (fx - px) + (fz - pz) * (fz - pz);
                if d < d1 {
                    d2 = d1;
                    d1 = d;
                    nearest = (cx, cz, fx, fz);
                } else if d < d2 {
                    d2 = d;
                }
            }
        }

        let (cell_x, cell_z, fx, fz) = nearest;
        Cell2D {
            f1: d1.sqrt(),
            f2: d2.sqrt(),
            value: unit_f64(mix(self.seed ^ SALT_VALUE, cell_x, 0, cell_z)),
            center_x: fx / self.frequency,
            center_z: fz / self.frequency,
            cell_x,
            cell_z,
        }
    }
}

impl Noise2D for Cellular2D {
    #[inline]
    fn noise(&self, x: f64, z: f64) -> f64 {
        self.cell(x, z).get(self.channel)
    }
}

/// 3D cellular noise.
#[derive(Clone, Debug)]
pub struct Cellular3D {
    seed: u64,
    frequency: f64,
    jitter: f64,
    channel: CellularReturn,
}

impl Cellular3D {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            frequency: 1.0,
            jitter: DEFAULT_JITTER,
            channel: CellularReturn::F1,
        }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn returning(mut self, channel: CellularReturn) -> Self {
        self.channel = channel;
        self
    }

    pub fn cell(&self, x: f64, y: f64, z: f64) -> Cell3D {
        let (px, py, pz) = (x * self.frequency, y * self.frequency, z * self.frequency);
        let (ix, iy, iz) = (px.floor() as i32, py.floor() as i32, pz.floor() as i32);

        let mut d1 = f64::MAX;
        let mut d2 = f64::MAX;
        let mut nearest = ([0; 3], [0.0; 3]);
        for cx in ix - 1..=ix + 1 {
            for cy in iy - 1..=iy + 1 {
                for cz in iz - 1..=iz + 1 {
                    let fx = cx as f64 + offset(self.seed, SALT_X, cx, cy, cz, self.jitter);
                    let fy = cy as f64 + offset(self.seed, SALT_Y, cx, cy, cz, self.jitter);
                    let fz = cz as f64 + offset(self.seed, SALT_Z, cx, cy, cz, self.jitter);
                    let d = (fx - px).powi(2) + (fy - py).powi(2) + (fz - pz).powi(2);
                    if d < d1 {
                        d2 = d1;
                        d1 = d;
                        nearest = ([cx, cy, cz], [fx, fy, fz]);
                    } else if d < d2 {
                        d2 = d;
                    }
                }
            }
        }

        let ([cell_x, cell_y, cell_z], [fx, fy, fz]) = nearest;
        Cell3D {
            f1: d1.sqrt(),
            f2: d2.sqrt(),
            value: unit_f64(mix(self.seed ^ SALT_VALUE, cell_x, cell_y, cell_z)),
            center_x: fx / self.frequency,
            center_y: fy / self.frequency,
            center_z: fz / self.frequency,
            cell_x,
            cell_y,
            cell_z,
        }
    }
}

impl Noise3D for Cellular3D {
    #[inline]
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        self.cell(x, y, z).get(self.channel)
    }
}
