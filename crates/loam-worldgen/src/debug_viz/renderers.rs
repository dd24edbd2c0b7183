//! Renderers for biome, height, river and section views.

use super::MapRegion;
use super::image::{DebugImage, Rgb};
use crate::aquifer::Substance;
use crate::biome::{BiomeGroup, VariantKind};
use crate::generator::WorldGenerator;
use crate::river::Flow;
use crate::units::{CHUNK_WIDTH, ChunkPos, block_to_quart};

const RIVER_BLUE: Rgb = (40, 110, 230);

/// Map a variant to a color. Oceans are blue, lakes and rivers lighter
/// blue, land from green lowlands to grey mountains with volcanic reds.
pub fn variant_color(variant: VariantKind) -> Rgb {
    use VariantKind::*;
    match variant {
        Ocean => (20, 50, 180),
        OceanReef => (30, 150, 170),
        DeepOcean => (10, 30, 120),
        DeepOceanTrench => (5, 15, 70),
        Shore => (230, 210, 140),
        Plains => (100, 180, 60),
        Hills => (80, 150, 50),
        Lowlands => (60, 140, 90),
        LowCanyons => (150, 120, 70),
        RollingHills => (90, 165, 70),
        Badlands => (200, 110, 50),
        InvertedBadlands => (180, 90, 40),
        Plateau => (160, 150, 100),
        Canyons => (170, 100, 60),
        Mountains => (130, 120, 110),
        OldMountains => (110, 115, 95),
        OceanicMountains => (100, 110, 130),
        VolcanicMountains => (150, 60, 50),
        VolcanicOceanicMountains => (120, 60, 80),
        _ => match variant.group() {
            BiomeGroup::River => RIVER_BLUE,
            _ => (70, 140, 220),
        },
    }
}

/// Map a surface height to a color relative to sea level.
///
/// Bands run deep ocean, shallow ocean, beach, lowlands, mountains, snow.
pub fn height_to_color(height: f64, sea_level: i32) -> Rgb {
    let h = height - sea_level as f64;
    if h < -30.0 {
        (0, 0, 128)
    } else if h < 0.0 {
        (30, 80, 200)
    } else if h < 2.0 {
        (220, 200, 130)
    } else if h < 60.0 {
        let t = h / 60.0;
        (
            (30.0 + t * 80.0) as u8,
            (160.0 - t * 40.0) as u8,
            (30.0 + t * 20.0) as u8,
        )
    } else if h < 120.0 {
        let t = (h - 60.0) / 60.0;
        (
            (110.0 + t * 40.0) as u8,
            (120.0 - t * 50.0) as u8,
            (50.0 + t * 20.0) as u8,
        )
    } else {
        let t = ((h - 120.0) / 60.0).min(1.0);
        let base = (150.0 + t * 105.0) as u8;
        (base, base, base)
    }
}

pub fn substance_color(substance: Substance) -> Rgb {
    match substance {
        Substance::Air => (170, 205, 240),
        Substance::Solid => (120, 110, 100),
        Substance::Water => (30, 80, 200),
        Substance::Lava => (240, 110, 20),
    }
}

/// Biome variant at each pixel.
pub fn render_biome_map(generator: &WorldGenerator, region: &MapRegion) -> DebugImage {
    let mut image = DebugImage::new(region.width, region.height);
    for (px, py, x, z) in region.pixels() {
        let variant = generator.variant(block_to_quart(x), block_to_quart(z));
        image.set(px, py, variant_color(variant));
    }
    image
}

/// Blended surface height at each pixel, river carving included.
pub fn render_height_map(generator: &WorldGenerator, region: &MapRegion) -> DebugImage {
    let mut image = DebugImage::new(region.width, region.height);
    for (px, py, x, z) in region.pixels() {
        let height = generator.surface_height(x, z);
        image.set(px, py, height_to_color(height, generator.sea_level()));
    }
    image
}

/// Land and sea in grey and dark blue with river flow drawn over them,
/// brighter toward the centerline.
pub fn render_river_map(generator: &WorldGenerator, region: &MapRegion) -> DebugImage {
    let mut image = DebugImage::new(region.width, region.height);
    for (px, py, x, z) in region.pixels() {
        let variant = generator.variant(block_to_quart(x), block_to_quart(z));
        let base = if variant.is_ocean() {
            (15, 25, 60)
        } else {
            (90, 90, 90)
        };
        image.set(px, py, base);
        if let Flow::Flowing { strength, .. } = generator.flow_at(x, z) {
            image.blend(px, py, RIVER_BLUE, 0.35 + 0.65 * strength);
        }
    }
    image
}

/// Vertical slice along the x axis at block `z`, one pixel per block from
/// `min_x` over `width` blocks, the top row being the highest generated y.
pub fn render_section(generator: &WorldGenerator, z: i32, min_x: i32, width: u32) -> DebugImage {
    let sampling = generator.sampling();
    let height = sampling.height as u32;
    let mut image = DebugImage::new(width, height);

    let first_chunk = ChunkPos::from_block(min_x, z);
    let last_chunk = ChunkPos::from_block(min_x + width as i32 - 1, z);
    for chunk_x in first_chunk.x..=last_chunk.x {
        let chunk = ChunkPos::new(chunk_x, first_chunk.z);
        let substances = generator.generate_chunk(chunk);
        let local_z = z - chunk.min_block_z();
        for local_x in 0..CHUNK_WIDTH {
            let px = chunk.min_block_x() + local_x - min_x;
            if px < 0 || px >= width as i32 {
                continue;
            }
            for py in 0..height {
                let y = sampling.max_y() - 1 - py as i32;
                let color = substance_color(substances.get(local_x, y, local_z));
                image.set(px as u32, py, color);
            }
        }
    }
    image
}
