//! Climate bands and the climate provider boundary.
//!
//! The generator never computes climate itself: a [`ChunkDataProvider`]
//! supplies a [`ClimateSnapshot`] per chunk, and the [`ClimateClassifier`]
//! buckets its temperature and rainfall into five bands each.

use loam_config::ClimateSettings;

use crate::noise::{Noise2D, Noise2DExt, OpenSimplex2D, SharedNoise2D};
use crate::seed::{derive_seed, det_sin};
use crate::units::{CHUNK_WIDTH, ChunkPos};

/// Temperature band, coldest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemperatureBand {
    Frozen,
    Cold,
    Normal,
    Lukewarm,
    Warm,
}

/// Rainfall band, driest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RainfallBand {
    Arid,
    Dry,
    Normal,
    Damp,
    Wet,
}

impl TemperatureBand {
    pub const ALL: [TemperatureBand; 5] = [
        Self::Frozen,
        Self::Cold,
        Self::Normal,
        Self::Lukewarm,
        Self::Warm,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Frozen => "frozen",
            Self::Cold => "cold",
            Self::Normal => "normal",
            Self::Lukewarm => "lukewarm",
            Self::Warm => "warm",
        }
    }
}

impl RainfallBand {
    pub const ALL: [RainfallBand; 5] = [Self::Arid, Self::Dry, Self::Normal, Self::Damp, Self::Wet];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Arid => "arid",
            Self::Dry => "dry",
            Self::Normal => "normal",
            Self::Damp => "damp",
            Self::Wet => "wet",
        }
    }
}

/// Maps temperature and rainfall to bands using four ascending cutoffs each.
///
/// Cutoffs are checked in ascending order and the first one the value is
/// below wins, so a value equal to a cutoff falls in the band above it.
/// Values above every cutoff (and NaN) land in the last band.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimateClassifier {
    temperature_cutoffs: [f32; 4],
    rainfall_cutoffs: [f32; 4],
}

#[inline]
fn band_index(value: f32, cutoffs: &[f32; 4]) -> usize {
    cutoffs
        .iter()
        .position(|&cutoff| value < cutoff)
        .unwrap_or(cutoffs.len())
}

impl ClimateClassifier {
    /// Build from validated settings. See `Config::validate`.
    pub fn new(settings: &ClimateSettings) -> Self {
        debug_assert!(
            settings.temperature_cutoffs.windows(2).all(|w| w[0] < w[1])
                && settings.rainfall_cutoffs.windows(2).all(|w| w[0] < w[1]),
            "climate cutoffs must be strictly increasing"
        );
        Self {
            temperature_cutoffs: settings.temperature_cutoffs,
            rainfall_cutoffs: settings.rainfall_cutoffs,
        }
    }

    pub fn temperature(&self, value: f32) -> TemperatureBand {
        TemperatureBand::ALL[band_index(value, &self.temperature_cutoffs)]
    }

    pub fn rainfall(&self, value: f32) -> RainfallBand {
        RainfallBand::ALL[band_index(value, &self.rainfall_cutoffs)]
    }

    pub fn classify(&self, temperature: f32, rainfall: f32) -> (TemperatureBand, RainfallBand) {
        (self.temperature(temperature), self.rainfall(rainfall))
    }
}

impl Default for ClimateClassifier {
    fn default() -> Self {
        Self::new(&ClimateSettings::default())
    }
}

/// Climate of one chunk, given at its four corners and bilinearly
/// interpolated inside.
///
/// Corner order is `[min x min z, max x min z, min x max z, max x max z]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateSnapshot {
    pub chunk: ChunkPos,
    pub temperature: [f32; 4],
    pub rainfall: [f32; 4],
}

impl ClimateSnapshot {
    /// A snapshot with the same climate everywhere in the chunk.
    pub fn uniform(chunk: ChunkPos, temperature: f32, rainfall: f32) -> Self {
        Self {
            chunk,
            temperature: [temperature; 4],
            rainfall: [rainfall; 4],
        }
    }

    fn lerp(&self, corners: &[f32; 4], block_x: i32, block_z: i32) -> f32 {
        let tx = ((block_x - self.chunk.min_block_x()).clamp(0, CHUNK_WIDTH - 1)) as f32
            / CHUNK_WIDTH as f32;
        let tz = ((block_z - self.chunk.min_block_z()).clamp(0, CHUNK_WIDTH - 1)) as f32
            / CHUNK_WIDTH as f32;
        let north = corners[0] + (corners[1] - corners[0]) * tx;
        let south = corners[2] + (corners[3] - corners[2]) * tx;
        north + (south - north) * tz
    }

    /// Average annual temperature at a block column in this chunk.
    pub fn average_temp(&self, block_x: i32, block_z: i32) -> f32 {
        self.lerp(&self.temperature, block_x, block_z)
    }

    /// Annual rainfall at a block column in this chunk.
    pub fn rainfall(&self, block_x: i32, block_z: i32) -> f32 {
        self.lerp(&self.rainfall, block_x, block_z)
    }
}

/// Source of per-chunk climate data.
pub trait ChunkDataProvider: Send + Sync {
    fn climate(&self, chunk: ChunkPos) -> ClimateSnapshot;
}

/// Deterministic stand-in climate for tools and tests.
///
/// Temperature follows a sine of Z with period `temperature_period` blocks
/// between roughly -24 and 24 degrees, rainfall is broad noise in `[0, 500]`.
pub struct NoiseClimateProvider {
    temperature_noise: SharedNoise2D,
    rainfall_noise: SharedNoise2D,
    temperature_period: f64,
}

impl NoiseClimateProvider {
    pub fn new(seed: i64) -> Self {
        Self::with_period(seed, 20_000.0)
    }

    pub fn with_period(seed: i64, temperature_period: f64) -> Self {
        let temperature_noise = OpenSimplex2D::new(derive_seed(seed, "climate/temperature"))
            .octaves(2, 0.5)
            .spread(0.002)
            .scaled(-4.0, 4.0)
            .shared();
        let rainfall_noise = OpenSimplex2D::new(derive_seed(seed, "climate/rainfall"))
            .octaves(3, 0.5)
            .spread(0.0015)
            .scaled_from(-0.875, 0.875, 0.0, 500.0)
            .flattened(0.0, 500.0)
            .shared();
        Self {
            temperature_noise,
            rainfall_noise,
            temperature_period,
        }
    }

    pub fn temperature_at(&self, block_x: i32, block_z: i32) -> f32 {
        let phase = block_z as f64 * std::f64::consts::TAU / self.temperature_period;
        let base = 20.0 * det_sin(phase);
        (base + self.temperature_noise.noise(block_x as f64, block_z as f64)) as f32
    }

    pub fn rainfall_at(&self, block_x: i32, block_z: i32) -> f32 {
        self.rainfall_noise.noise(block_x as f64, block_z as f64) as f32
    }
}

impl ChunkDataProvider for NoiseClimateProvider {
    fn climate(&self, chunk: ChunkPos) -> ClimateSnapshot {
        let (x0, z0) = (chunk.min_block_x(), chunk.min_block_z());
        let (x1, z1) = (x0 + CHUNK_WIDTH, z0 + CHUNK_WIDTH);
        let corners = [(x0, z0), (x1, z0), (x0, z1), (x1, z1)];
        ClimateSnapshot {
            chunk,
            temperature: corners.map(|(x, z)| self.temperature_at(x, z)),
            rainfall: corners.map(|(x, z)| self.rainfall_at(x, z)),
        }
    }
}

/// The same climate everywhere.
#[derive(Clone, Copy, Debug)]
pub struct UniformClimate {
    pub temperature: f32,
    pub rainfall: f32,
}

impl ChunkDataProvider for UniformClimate {
    fn climate(&self, chunk: ChunkPos) -> ClimateSnapshot {
        ClimateSnapshot::uniform(chunk, self.temperature, self.rainfall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_belongs_to_higher_band() {
        let classifier = ClimateClassifier::default();
        assert_eq!(classifier.temperature(-3.75), TemperatureBand::Normal);
        assert_eq!(classifier.temperature(-3.7501), TemperatureBand::Cold);
        assert_eq!(classifier.rainfall(200.0), RainfallBand::Normal);
        assert_eq!(classifier.rainfall(199.99), RainfallBand::Dry);
    }

    #[test]
    fn test_every_cutoff_boundary() {
        let settings = ClimateSettings {
            temperature_cutoffs: [0.0, 10.0, 20.0, 30.0],
            rainfall_cutoffs: [100.0, 200.0, 300.0, 400.0],
        };
        let classifier = ClimateClassifier::new(&settings);
        for (i, &cutoff) in settings.temperature_cutoffs.iter().enumerate() {
            assert_eq!(classifier.temperature(cutoff), TemperatureBand::ALL[i + 1]);
        }
        for (i, &cutoff) in settings.rainfall_cutoffs.iter().enumerate() {
            assert_eq!(classifier.rainfall(cutoff), RainfallBand::ALL[i + 1]);
        }
    }

    #[test]
    fn test_bands_are_monotonic_without_gaps() {
        let classifier = ClimateClassifier::default();
        let mut previous = TemperatureBand::Frozen;
        let mut seen = Vec::new();
        for i in -400..400 {
            let band = classifier.temperature(i as f32 * 0.125);
            assert!(band >= previous, "band decreased at {}", i as f32 * 0.125);
            if !seen.contains(&band) {
                seen.push(band);
            }
            previous = band;
        }
        assert_eq!(seen, TemperatureBand::ALL.to_vec());
    }

    #[test]
    fn test_extremes_are_total() {
        let classifier = ClimateClassifier::default();
        assert_eq!(classifier.temperature(f32::NEG_INFINITY), TemperatureBand::Frozen);
        assert_eq!(classifier.temperature(f32::INFINITY), TemperatureBand::Warm);
        assert_eq!(classifier.rainfall(f32::MIN), RainfallBand::Arid);
        assert_eq!(classifier.rainfall(f32::MAX), RainfallBand::Wet);
    }

    #[test]
    fn test_snapshot_corners_and_center() {
        let snapshot = ClimateSnapshot {
            chunk: ChunkPos::new(1, -1),
            temperature: [0.0, 16.0, 0.0, 16.0],
            rainfall: [100.0, 100.0, 300.0, 300.0],
        };
        assert_eq!(snapshot.average_temp(16, -16), 0.0);
        assert_eq!(snapshot.average_temp(24, -16), 8.0);
        assert_eq!(snapshot.rainfall(16, -8), 200.0);
    }

    #[test]
    fn test_noise_climate_is_deterministic() {
        let a = NoiseClimateProvider::new(1234);
        let b = NoiseClimateProvider::new(1234);
        for i in -20..20 {
            let chunk = ChunkPos::new(i * 7, i * -13);
            assert_eq!(a.climate(chunk), b.climate(chunk));
        }
    }

    #[test]
    fn test_noise_climate_ranges() {
        let provider = NoiseClimateProvider::new(5);
        for i in -100..100 {
            let (x, z) = (i * 97, i * 211);
            let t = provider.temperature_at(x, z);
            let r = provider.rainfall_at(x, z);
            assert!((-24.0..=24.0).contains(&t), "temperature out of range: {t}");
            assert!((0.0..=500.0).contains(&r), "rainfall out of range: {r}");
        }
    }
}
