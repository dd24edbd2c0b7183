//! Per-chunk 3D density sampling.
//!
//! Density channels are evaluated at the corners of coarse cells and
//! trilinearly interpolated to every voxel, then combined and handed to the
//! aquifer to pick a substance.

pub mod chunk;
pub mod cursor;
pub mod interpolator;
pub mod noise_sampler;
pub mod settings;

pub use chunk::{ChunkNoiseSampler, ChunkSubstances, cave_density, terrain_density};
pub use cursor::{Cell, CellLayer, CellPlane, CellRow, ChunkPass, InterpolatorBank, Voxel};
pub use interpolator::TrilinearInterpolator;
pub use noise_sampler::{AquiferNoises, DensityChannel, NoiseSampler};
pub use settings::ChunkNoiseSamplingSettings;
