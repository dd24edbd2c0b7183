//! Fills one chunk from the density channels.

use tracing::trace;

use super::cursor::{InterpolatorBank, Voxel};
use super::noise_sampler::{DensityChannel, NoiseSampler};
use super::settings::ChunkNoiseSamplingSettings;
use crate::aquifer::{NoiseBasedAquifer, Substance};
use crate::biome::SurfaceColumn;
use crate::river::Flow;
use crate::units::{CHUNK_WIDTH, ChunkPos};

/// Density change per block of distance from the surface.
const TERRAIN_SLOPE: f64 = 0.125;
/// Overhang strength of the terrain base channel.
const TERRAIN_BASE_AMPLITUDE: f64 = 0.25;
/// Caves close up within this many blocks of the surface.
const CAVE_SURFACE_MARGIN: f64 = 8.0;

const COLUMNS: usize = (CHUNK_WIDTH * CHUNK_WIDTH) as usize;

#[inline]
fn column_index(local_x: i32, local_z: i32) -> usize {
    (local_x + CHUNK_WIDTH * local_z) as usize
}

/// Terrain density before caves. Positive is solid.
#[inline]
pub fn terrain_density(surface: f64, y: i32, base: f64) -> f64 {
    (surface - y as f64) * TERRAIN_SLOPE + base * TERRAIN_BASE_AMPLITUDE
}

/// Density of the cave channels at a voxel. Negative is open.
pub fn cave_density(voxel: &Voxel<'_, '_>, surface: f64) -> f64 {
    let sample = |channel: DensityChannel| voxel.sample(channel.index());

    let noodle = if sample(DensityChannel::NoodleToggle) >= 0.0 {
        let t = ((sample(DensityChannel::NoodleThickness) + 1.0) * 0.5).clamp(0.0, 1.0);
        let thickness = 0.05 + 0.05 * t;
        let ridge_a = (1.5 * sample(DensityChannel::NoodleRidgeA)).abs() - thickness;
        let ridge_b = (1.5 * sample(DensityChannel::NoodleRidgeB)).abs() - thickness;
        ridge_a.max(ridge_b)
    } else {
        f64::INFINITY
    };

    let caverns = sample(DensityChannel::Cheese).max(sample(DensityChannel::Pillar));
    let caves = sample(DensityChannel::Spaghetti2D)
        .min(sample(DensityChannel::Spaghetti3D))
        .min(noodle)
        .min(caverns);

    let depth = surface - voxel.position().1 as f64;
    caves + ((CAVE_SURFACE_MARGIN - depth) * 0.1).max(0.0)
}

/// Resolved substances of one chunk.
#[derive(Clone, Debug)]
pub struct ChunkSubstances {
    chunk: ChunkPos,
    min_y: i32,
    height: i32,
    voxels: Vec<Substance>,
    surface: Vec<i32>,
    flows: Vec<Flow>,
    fluid_updates: Vec<(i32, i32, i32)>,
}

impl ChunkSubstances {
    fn new(chunk: ChunkPos, min_y: i32, height: i32) -> Self {
        Self {
            chunk,
            min_y,
            height,
            voxels: vec![Substance::Air; COLUMNS * height as usize],
            surface: vec![0; COLUMNS],
            flows: vec![Flow::None; COLUMNS],
            fluid_updates: Vec::new(),
        }
    }

    #[inline]
    fn index(&self, local_x: i32, y: i32, local_z: i32) -> Option<usize> {
        let dy = y - self.min_y;
        ((0..self.height).contains(&dy)
            && (0..CHUNK_WIDTH).contains(&local_x)
            && (0..CHUNK_WIDTH).contains(&local_z))
        .then(|| dy as usize * COLUMNS + column_index(local_x, local_z))
    }

    /// Substance at chunk-local x/z and world y. Air outside the chunk.
    pub fn get(&self, local_x: i32, y: i32, local_z: i32) -> Substance {
        self.index(local_x, y, local_z)
            .map_or(Substance::Air, |i| self.voxels[i])
    }

    fn set(&mut self, local_x: i32, y: i32, local_z: i32, substance: Substance) {
        if let Some(i) = self.index(local_x, y, local_z) {
            self.voxels[i] = substance;
        }
    }

    pub fn chunk(&self) -> ChunkPos {
        self.chunk
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn max_y(&self) -> i32 {
        self.min_y + self.height
    }

    /// Surface height of a column, rounded down.
    pub fn surface_height(&self, local_x: i32, local_z: i32) -> i32 {
        self.surface[column_index(local_x, local_z)]
    }

    pub fn flow(&self, local_x: i32, local_z: i32) -> Flow {
        self.flows[column_index(local_x, local_z)]
    }

    /// World positions of fluids placed where two aquifers meet.
    pub fn fluid_updates(&self) -> &[(i32, i32, i32)] {
        &self.fluid_updates
    }

    pub fn count(&self, substance: Substance) -> usize {
        self.voxels.iter().filter(|&&s| s == substance).count()
    }
}

/// Fills one chunk. Built per chunk and consumed by [`fill`](Self::fill).
pub struct ChunkNoiseSampler<'w> {
    noise: &'w NoiseSampler,
    settings: ChunkNoiseSamplingSettings,
    chunk: ChunkPos,
    sea_level: i32,
    columns: &'w [SurfaceColumn],
}

impl<'w> ChunkNoiseSampler<'w> {
    /// `columns` holds the chunk's 16x16 surface columns, X fastest.
    pub fn new(
        noise: &'w NoiseSampler,
        settings: &ChunkNoiseSamplingSettings,
        chunk: ChunkPos,
        sea_level: i32,
        columns: &'w [SurfaceColumn],
    ) -> Self {
        assert_eq!(columns.len(), COLUMNS, "a chunk has 16x16 surface columns");
        Self {
            noise,
            settings: settings.for_chunk(chunk),
            chunk,
            sea_level,
            columns,
        }
    }

    /// Highest block Y that may be anything but air in a cell column.
    fn cell_top(&self, cell_x: i32, cell_z: i32) -> i32 {
        let width = self.settings.cell_width;
        let mut top = self.sea_level;
        for lx in 0..width {
            for lz in 0..width {
                let column = &self.columns[column_index(cell_x * width + lx, cell_z * width + lz)];
                top = top.max(column.height.ceil() as i32 + 2);
                if let Some((_, carving_top)) = column.carving {
                    top = top.max(carving_top.ceil() as i32);
                }
            }
        }
        top
    }

    /// Run the fill. `surface` estimates terrain height for the aquifer.
    pub fn fill(self, surface: impl Fn(i32, i32) -> i32) -> ChunkSubstances {
        let settings = self.settings;
        let mut out = ChunkSubstances::new(self.chunk, settings.min_y, settings.height);
        for (i, column) in self.columns.iter().enumerate() {
            out.surface[i] = column.height.floor() as i32;
            out.flows[i] = column.flow;
        }

        let mut aquifer = NoiseBasedAquifer::new(
            self.noise.aquifer(),
            &settings,
            self.chunk,
            self.sea_level,
            surface,
        );
        let (width, height) = (settings.cell_width, settings.cell_height);

        let mut pass = InterpolatorBank::new(settings, self.noise.channels()).begin();
        while let Some(mut plane) = pass.next_plane() {
            let cell_x = plane.cell_x();
            for cell_z in 0..settings.cell_count_xz {
                let top = self.cell_top(cell_x, cell_z);
                let top_cell = (top - settings.min_y)
                    .div_euclid(height)
                    .min(settings.cell_count_y - 1);
                for cell_y in (0..=top_cell).rev() {
                    let mut cell = plane.select(cell_y, cell_z);
                    for ly in (0..height).rev() {
                        let mut layer = cell.at_y(ly);
                        for lx in 0..width {
                            let mut row = layer.at_x(lx);
                            let local_x = cell_x * width + lx;
                            for lz in 0..width {
                                let voxel = row.at_z(lz);
                                let local_z = cell_z * width + lz;
                                let column = &self.columns[column_index(local_x, local_z)];
                                let (x, y, z) = voxel.position();
                                let (substance, update) =
                                    self.resolve(&mut aquifer, &voxel, column);
                                out.set(local_x, y, local_z, substance);
                                if update {
                                    out.fluid_updates.push((x, y, z));
                                }
                            }
                        }
                    }
                }
            }
        }

        trace!(
            chunk_x = self.chunk.x,
            chunk_z = self.chunk.z,
            fluid_updates = out.fluid_updates.len(),
            "filled chunk"
        );
        out
    }

    fn resolve<S: Fn(i32, i32) -> i32>(
        &self,
        aquifer: &mut NoiseBasedAquifer<'_, S>,
        voxel: &Voxel<'_, '_>,
        column: &SurfaceColumn,
    ) -> (Substance, bool) {
        let (x, y, z) = voxel.position();
        if let Some((bottom, top)) = column.carving
            && (bottom..top).contains(&(y as f64))
        {
            let carved = if y < self.sea_level {
                Substance::Water
            } else {
                Substance::Air
            };
            return (carved, false);
        }

        let terrain = terrain_density(
            column.height,
            y,
            voxel.sample(DensityChannel::TerrainBase.index()),
        );
        let density = terrain.clamp(-1.0, 1.0).min(cave_density(voxel, column.height));
        let barrier = voxel.sample(DensityChannel::AquiferBarrier.index());
        let substance = aquifer.compute_substance(x, y, z, terrain, density, barrier);
        (
            substance,
            substance.is_fluid() && aquifer.should_schedule_fluid_update(),
        )
    }
}
