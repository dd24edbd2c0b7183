//! Interpolation cell geometry for one chunk.

use loam_config::Config;

use crate::error::WorldgenError;
use crate::units::{CHUNK_WIDTH, ChunkPos};

/// Cell layout of a chunk's density grid.
///
/// Corners sit on multiples of the cell size in world space, so adjacent
/// chunks sample the same corner values along their shared faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkNoiseSamplingSettings {
    pub min_y: i32,
    pub height: i32,
    pub cell_width: i32,
    pub cell_height: i32,
    /// Cells along X and along Z.
    pub cell_count_xz: i32,
    pub cell_count_y: i32,
    pub first_cell_x: i32,
    pub first_cell_y: i32,
    pub first_cell_z: i32,
}

fn invalid(reason: String) -> WorldgenError {
    WorldgenError::InvalidSampling { reason }
}

impl ChunkNoiseSamplingSettings {
    /// Geometry for the chunk at the origin.
    pub fn new(
        min_y: i32,
        height: u32,
        cell_width: u32,
        cell_height: u32,
    ) -> Result<Self, WorldgenError> {
        let height = i32::try_from(height)
            .map_err(|_| invalid(format!("height {height} does not fit in i32")))?;
        let (cell_width, cell_height) = (cell_width as i32, cell_height as i32);
        if cell_width <= 0 || CHUNK_WIDTH % cell_width != 0 {
            return Err(invalid(format!(
                "cell width {cell_width} does not divide the chunk width {CHUNK_WIDTH}"
            )));
        }
        if cell_height <= 0 || height <= 0 || height % cell_height != 0 {
            return Err(invalid(format!(
                "cell height {cell_height} does not divide the world height {height}"
            )));
        }
        if min_y.rem_euclid(cell_height) != 0 {
            return Err(invalid(format!(
                "min_y {min_y} is not a multiple of the cell height {cell_height}"
            )));
        }
        Ok(Self {
            min_y,
            height,
            cell_width,
            cell_height,
            cell_count_xz: CHUNK_WIDTH / cell_width,
            cell_count_y: height / cell_height,
            first_cell_x: 0,
            first_cell_y: min_y.div_euclid(cell_height),
            first_cell_z: 0,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WorldgenError> {
        Self::new(
            config.world.min_y,
            config.world.height,
            config.sampling.cell_width,
            config.sampling.cell_height,
        )
    }

    /// The same geometry shifted onto `chunk`.
    pub fn for_chunk(&self, chunk: ChunkPos) -> Self {
        Self {
            first_cell_x: chunk.min_block_x().div_euclid(self.cell_width),
            first_cell_z: chunk.min_block_z().div_euclid(self.cell_width),
            ..*self
        }
    }

    /// One past the highest generated block Y.
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.min_y + self.height
    }

    /// World position of a cell corner.
    #[inline]
    pub fn corner(&self, cell_x: i32, cell_y: i32, cell_z: i32) -> (i32, i32, i32) {
        (
            (self.first_cell_x + cell_x) * self.cell_width,
            (self.first_cell_y + cell_y) * self.cell_height,
            (self.first_cell_z + cell_z) * self.cell_width,
        )
    }

    /// Number of corner samples in one X plane.
    #[inline]
    pub(crate) fn plane_len(&self) -> usize {
        ((self.cell_count_y + 1) * (self.cell_count_xz + 1)) as usize
    }

    #[inline]
    pub(crate) fn plane_index(&self, cell_y: i32, cell_z: i32) -> usize {
        (cell_z * (self.cell_count_y + 1) + cell_y) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let settings = ChunkNoiseSamplingSettings::from_config(&Config::default()).unwrap();
        assert_eq!(settings.cell_count_xz, 4);
        assert_eq!(settings.cell_count_y, 48);
        assert_eq!(settings.first_cell_y, -8);
        assert_eq!(settings.max_y(), 320);
    }

    #[test]
    fn test_for_chunk_aligns_corners() {
        let settings = ChunkNoiseSamplingSettings::new(-64, 384, 4, 8).unwrap();
        let chunk = settings.for_chunk(ChunkPos::new(-3, 5));
        assert_eq!(chunk.corner(0, 0, 0), (-48, -64, 80));
        assert_eq!(chunk.corner(4, 48, 4), (-32, 320, 96));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(ChunkNoiseSamplingSettings::new(-64, 384, 3, 8).is_err());
        assert!(ChunkNoiseSamplingSettings::new(-64, 384, 4, 7).is_err());
        assert!(ChunkNoiseSamplingSettings::new(-60, 384, 4, 8).is_err());
        assert!(ChunkNoiseSamplingSettings::new(0, 0, 4, 8).is_err());
        assert!(matches!(
            ChunkNoiseSamplingSettings::new(-64, 384, 0, 8),
            Err(WorldgenError::InvalidSampling { .. })
        ));
    }
}
