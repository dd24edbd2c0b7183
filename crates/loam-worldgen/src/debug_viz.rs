//! Debug renders of generated terrain: biome map, height map, river map
//! and vertical substance sections.

mod image;
mod renderers;

pub use self::image::{DebugImage, Rgb};
pub use renderers::{
    height_to_color, render_biome_map, render_height_map, render_river_map, render_section,
    substance_color, variant_color,
};

/// Horizontal area rendered by the map renderers.
///
/// Pixel `(px, py)` samples block `(min_x + px * scale, min_z + py * scale)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapRegion {
    pub min_x: i32,
    pub min_z: i32,
    pub width: u32,
    pub height: u32,
    /// Blocks per pixel.
    pub scale: u32,
}

impl MapRegion {
    /// Region of `width x height` pixels centered on a block.
    pub fn centered(center_x: i32, center_z: i32, width: u32, height: u32, scale: u32) -> Self {
        let scale = scale.max(1);
        Self {
            min_x: center_x - (width * scale / 2) as i32,
            min_z: center_z - (height * scale / 2) as i32,
            width,
            height,
            scale,
        }
    }

    #[inline]
    pub fn block(&self, px: u32, py: u32) -> (i32, i32) {
        (
            self.min_x + (px * self.scale) as i32,
            self.min_z + (py * self.scale) as i32,
        )
    }

    /// Every pixel with its block column, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, i32, i32)> + '_ {
        (0..self.height).flat_map(move |py| {
            (0..self.width).map(move |px| {
                let (x, z) = self.block(px, py);
                (px, py, x, z)
            })
        })
    }
}
