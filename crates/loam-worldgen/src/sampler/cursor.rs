//! Phased cursor over a set of interpolators.
//!
//! Each step of the interpolation protocol is a type that borrows the
//! previous one, so only the next legal operation can be reached:
//!
//! ```text
//! InterpolatorBank -> ChunkPass -> CellPlane -> Cell -> CellLayer -> CellRow -> Voxel
//!   (first plane)    (advance X)   (select YZ)   (Y)      (X)          (Z)      (sample)
//! ```
//!
//! A bank is consumed by [`InterpolatorBank::begin`], so it cannot be
//! reused for a second chunk.

use super::interpolator::TrilinearInterpolator;
use super::settings::ChunkNoiseSamplingSettings;
use crate::noise::Noise3D;

/// One interpolator per density channel, all over the same chunk geometry.
pub struct InterpolatorBank<'a> {
    settings: ChunkNoiseSamplingSettings,
    interpolators: Vec<TrilinearInterpolator<'a>>,
}

impl<'a> InterpolatorBank<'a> {
    pub fn new(
        settings: ChunkNoiseSamplingSettings,
        sources: impl IntoIterator<Item = &'a dyn Noise3D>,
    ) -> Self {
        Self {
            settings,
            interpolators: sources
                .into_iter()
                .map(|source| TrilinearInterpolator::new(settings, source))
                .collect(),
        }
    }

    pub fn settings(&self) -> &ChunkNoiseSamplingSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.interpolators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interpolators.is_empty()
    }

    /// Sample the first X plane and start walking the chunk.
    pub fn begin(mut self) -> ChunkPass<'a> {
        for interpolator in &mut self.interpolators {
            interpolator.initialize_for_first_cell_x();
        }
        ChunkPass {
            bank: self,
            next_cell_x: 0,
        }
    }
}

/// A chunk walk in ascending cell X.
pub struct ChunkPass<'a> {
    bank: InterpolatorBank<'a>,
    next_cell_x: i32,
}

impl<'a> ChunkPass<'a> {
    /// Advance to the next X cell, or `None` once every plane is done.
    ///
    /// Slices are swapped when the following plane is requested.
    pub fn next_plane(&mut self) -> Option<CellPlane<'_, 'a>> {
        let cell_x = self.next_cell_x;
        if cell_x >= self.bank.settings.cell_count_xz {
            return None;
        }
        for interpolator in &mut self.bank.interpolators {
            if cell_x > 0 {
                interpolator.swap_slices();
            }
            interpolator.advance_cell_x(cell_x);
        }
        self.next_cell_x += 1;
        Some(CellPlane {
            settings: self.bank.settings,
            interpolators: &mut self.bank.interpolators,
            cell_x,
        })
    }
}

/// The cells between two adjacent X corner planes.
pub struct CellPlane<'p, 'a> {
    settings: ChunkNoiseSamplingSettings,
    interpolators: &'p mut [TrilinearInterpolator<'a>],
    cell_x: i32,
}

impl<'a> CellPlane<'_, 'a> {
    pub fn cell_x(&self) -> i32 {
        self.cell_x
    }

    pub fn select(&mut self, cell_y: i32, cell_z: i32) -> Cell<'_, 'a> {
        for interpolator in self.interpolators.iter_mut() {
            interpolator.select_cell_yz(cell_y, cell_z);
        }
        let origin = self.settings.corner(self.cell_x, cell_y, cell_z);
        Cell {
            settings: self.settings,
            interpolators: &mut *self.interpolators,
            origin,
        }
    }
}

/// One coarse cell with its eight corners loaded.
pub struct Cell<'c, 'a> {
    settings: ChunkNoiseSamplingSettings,
    interpolators: &'c mut [TrilinearInterpolator<'a>],
    origin: (i32, i32, i32),
}

impl<'a> Cell<'_, 'a> {
    /// World position of the cell's low corner.
    pub fn origin(&self) -> (i32, i32, i32) {
        self.origin
    }

    pub fn at_y(&mut self, local_y: i32) -> CellLayer<'_, 'a> {
        let delta = local_y as f64 / self.settings.cell_height as f64;
        for interpolator in self.interpolators.iter_mut() {
            interpolator.update_for_y(delta);
        }
        CellLayer {
            cell_width: self.settings.cell_width,
            interpolators: &mut *self.interpolators,
            position: (self.origin.0, self.origin.1 + local_y, self.origin.2),
        }
    }
}

/// A horizontal layer of a cell at fixed Y.
pub struct CellLayer<'l, 'a> {
    cell_width: i32,
    interpolators: &'l mut [TrilinearInterpolator<'a>],
    position: (i32, i32, i32),
}

impl<'a> CellLayer<'_, 'a> {
    pub fn y(&self) -> i32 {
        self.position.1
    }

    pub fn at_x(&mut self, local_x: i32) -> CellRow<'_, 'a> {
        let delta = local_x as f64 / self.cell_width as f64;
        for interpolator in self.interpolators.iter_mut() {
            interpolator.update_for_x(delta);
        }
        CellRow {
            cell_width: self.cell_width,
            interpolators: &mut *self.interpolators,
            position: (self.position.0 + local_x, self.position.1, self.position.2),
        }
    }
}

/// A row of voxels along Z at fixed X and Y.
pub struct CellRow<'r, 'a> {
    cell_width: i32,
    interpolators: &'r mut [TrilinearInterpolator<'a>],
    position: (i32, i32, i32),
}

impl<'a> CellRow<'_, 'a> {
    pub fn x(&self) -> i32 {
        self.position.0
    }

    pub fn at_z(&mut self, local_z: i32) -> Voxel<'_, 'a> {
        let delta = local_z as f64 / self.cell_width as f64;
        for interpolator in self.interpolators.iter_mut() {
            interpolator.update_for_z(delta);
        }
        Voxel {
            interpolators: &*self.interpolators,
            position: (self.position.0, self.position.1, self.position.2 + local_z),
        }
    }
}

/// A fully interpolated voxel.
pub struct Voxel<'v, 'a> {
    interpolators: &'v [TrilinearInterpolator<'a>],
    position: (i32, i32, i32),
}

impl Voxel<'_, '_> {
    /// World block position.
    pub fn position(&self) -> (i32, i32, i32) {
        self.position
    }

    /// Interpolated value of the channel at `index` in bank order.
    #[inline]
    pub fn sample(&self, index: usize) -> f64 {
        self.interpolators[index].sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::FnNoise3D;
    use crate::units::ChunkPos;

    #[test]
    fn test_walk_visits_every_voxel_with_exact_linear_values() {
        let a = FnNoise3D(|x: f64, y: f64, z: f64| x + 2.0 * y - z);
        let b = FnNoise3D(|_: f64, y: f64, z: f64| 3.0 * z - y);
        let settings = ChunkNoiseSamplingSettings::new(-16, 32, 4, 8)
            .unwrap()
            .for_chunk(ChunkPos::new(-1, 3));
        let bank = InterpolatorBank::new(settings, [&a as &dyn Noise3D, &b as &dyn Noise3D]);
        assert_eq!(bank.len(), 2);

        let mut pass = bank.begin();
        let mut visited = 0;
        while let Some(mut plane) = pass.next_plane() {
            for cell_z in 0..settings.cell_count_xz {
                for cell_y in 0..settings.cell_count_y {
                    let mut cell = plane.select(cell_y, cell_z);
                    for ly in 0..settings.cell_height {
                        let mut layer = cell.at_y(ly);
                        for lx in 0..settings.cell_width {
                            let mut row = layer.at_x(lx);
                            for lz in 0..settings.cell_width {
                                let voxel = row.at_z(lz);
                                let (x, y, z) = voxel.position();
                                let (x, y, z) = (x as f64, y as f64, z as f64);
                                assert!((voxel.sample(0) - a.noise(x, y, z)).abs() < 1e-9);
                                assert!((voxel.sample(1) - b.noise(x, y, z)).abs() < 1e-9);
                                visited += 1;
                            }
                        }
                    }
                }
            }
        }
        assert_eq!(visited, 16 * 16 * 32);
    }

    #[test]
    fn test_voxel_positions_cover_chunk() {
        let flat = FnNoise3D(|_: f64, _: f64, _: f64| 0.0);
        let settings = ChunkNoiseSamplingSettings::new(0, 8, 8, 8)
            .unwrap()
            .for_chunk(ChunkPos::new(2, 0));
        let mut seen = std::collections::HashSet::new();
        let mut pass = InterpolatorBank::new(settings, [&flat as &dyn Noise3D]).begin();
        while let Some(mut plane) = pass.next_plane() {
            for cell_z in 0..settings.cell_count_xz {
                let mut cell = plane.select(0, cell_z);
                for ly in 0..8 {
                    let mut layer = cell.at_y(ly);
                    for lx in 0..8 {
                        let mut row = layer.at_x(lx);
                        for lz in 0..8 {
                            seen.insert(row.at_z(lz).position());
                        }
                    }
                }
            }
        }
        assert_eq!(seen.len(), 16 * 16 * 8);
        assert!(seen.contains(&(32, 0, 0)));
        assert!(seen.contains(&(47, 7, 15)));
    }
}
