//! Render world-generation debug maps and batch-generate chunks.

mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use loam_config::{CliArgs, Config};
use loam_worldgen::debug_viz::{
    render_biome_map, render_height_map, render_river_map, render_section,
};
use loam_worldgen::units::block_to_quart;
use loam_worldgen::{
    ChunkGenerationPool, ChunkPos, DebugImage, MapRegion, NoiseClimateProvider, Substance,
    WorldGenerator, WorldgenError,
};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MapgenError {
    #[error(transparent)]
    Worldgen(#[from] WorldgenError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("pixel buffer does not match {width}x{height}")]
    BufferSize { width: u32, height: u32 },
    #[error("timed out with {pending} chunks outstanding")]
    Timeout { pending: u64 },
}

#[derive(Parser, Debug)]
#[command(name = "loam-mapgen", about = "World generation debug tool")]
struct Cli {
    #[command(flatten)]
    common: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct MapArgs {
    /// Block X at the image center.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    center_x: i32,
    /// Block Z at the image center.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    center_z: i32,
    /// Image width and height in pixels.
    #[arg(long, default_value_t = 512)]
    size: u32,
    /// Blocks per pixel.
    #[arg(long, default_value_t = 16)]
    scale: u32,
    /// Output PNG path.
    #[arg(long, short)]
    out: PathBuf,
}

impl MapArgs {
    fn region(&self) -> MapRegion {
        MapRegion::centered(self.center_x, self.center_z, self.size, self.size, self.scale)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Biome variant map.
    Biomes(MapArgs),
    /// Surface height map.
    Heights(MapArgs),
    /// River flow over land and sea.
    Rivers(MapArgs),
    /// Vertical substance slice along the x axis.
    Section {
        /// Block Z of the slice.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        z: i32,
        /// First block X.
        #[arg(long, default_value_t = -128, allow_negative_numbers = true)]
        min_x: i32,
        /// Width in blocks.
        #[arg(long, default_value_t = 256)]
        width: u32,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Generate a square of chunks on the worker pool and report totals.
    Chunks {
        /// Chunks in each direction from the origin chunk.
        #[arg(long, default_value_t = 4)]
        radius: i32,
        /// Worker threads; defaults to the machine's cores minus two.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the spawn column.
    Spawn,
}

fn main() {
    let cli = Cli::parse();

    let config_dir = cli.common.config_dir();
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&cli.common);

    let log_dir = config_dir.join("logs");
    loam_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(&config, cli.command) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &Config, command: Command) -> Result<(), MapgenError> {
    let climate = Arc::new(NoiseClimateProvider::new(config.world.seed));
    let generator = WorldGenerator::new(config, climate)?;

    match command {
        Command::Biomes(args) => {
            write_map(render_biome_map(&generator, &args.region()), &args)?;
        }
        Command::Heights(args) => {
            write_map(render_height_map(&generator, &args.region()), &args)?;
        }
        Command::Rivers(args) => {
            write_map(render_river_map(&generator, &args.region()), &args)?;
            info!(
                partitions = generator.watersheds().partition_count(),
                "river partitions built"
            );
        }
        Command::Section { z, min_x, width, out } => {
            let start = Instant::now();
            output::write_png(render_section(&generator, z, min_x, width), &out)?;
            info!(
                path = %out.display(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "wrote section"
            );
        }
        Command::Chunks { radius, threads } => {
            generate_chunks(Arc::new(generator), radius, threads)?;
        }
        Command::Spawn => {
            let (x, z) = generator.find_spawn();
            let biome = generator.biome(block_to_quart(x), block_to_quart(z));
            println!("spawn: {x} {z} ({})", biome.name);
        }
    }
    Ok(())
}

fn write_map(image: DebugImage, args: &MapArgs) -> Result<(), MapgenError> {
    let colors = image.unique_color_count();
    output::write_png(image, &args.out)?;
    info!(path = %args.out.display(), size = args.size, scale = args.scale, colors, "wrote map");
    Ok(())
}

/// Chunks in a square of `radius` around the origin, nearest first.
fn chunks_by_distance(radius: i32) -> Vec<ChunkPos> {
    let r = radius.max(0);
    let mut chunks: Vec<_> = (-r..=r)
        .flat_map(|z| (-r..=r).map(move |x| ChunkPos::new(x, z)))
        .collect();
    chunks.sort_by_key(|c| (c.x * c.x + c.z * c.z, c.z, c.x));
    chunks
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Totals {
    chunks: usize,
    solid: usize,
    water: usize,
    lava: usize,
    fluid_updates: usize,
    generation_us: u64,
}

fn generate_chunks(
    generator: Arc<WorldGenerator>,
    radius: i32,
    threads: Option<usize>,
) -> Result<(), MapgenError> {
    let pool = match threads {
        Some(threads) => ChunkGenerationPool::new(generator, threads, 64, 128)?,
        None => ChunkGenerationPool::with_defaults(generator)?,
    };

    let start = Instant::now();
    let deadline = start + Duration::from_secs(600);
    let mut pending = chunks_by_distance(radius).into_iter().peekable();
    let mut totals = Totals::default();

    while pending.peek().is_some() || pool.in_flight_count() > 0 {
        while let Some(&chunk) = pending.peek() {
            if pool.submit(chunk).is_err() {
                break;
            }
            pending.next();
        }
        for done in pool.drain_results() {
            let substances = &done.substances;
            totals.chunks += 1;
            totals.solid += substances.count(Substance::Solid);
            totals.water += substances.count(Substance::Water);
            totals.lava += substances.count(Substance::Lava);
            totals.fluid_updates += substances.fluid_updates().len();
            totals.generation_us += done.generation_time_us;
        }
        if Instant::now() > deadline {
            warn!(chunks = totals.chunks, "giving up on chunk batch");
            return Err(MapgenError::Timeout {
                pending: pool.in_flight_count(),
            });
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    let elapsed = start.elapsed();
    info!(
        chunks = totals.chunks,
        threads = pool.thread_count(),
        solid = totals.solid,
        water = totals.water,
        lava = totals.lava,
        fluid_updates = totals.fluid_updates,
        mean_chunk_us = totals.generation_us / totals.chunks.max(1) as u64,
        elapsed_ms = elapsed.as_millis() as u64,
        "generated chunk batch"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "loam-mapgen",
            "--seed",
            "-7",
            "biomes",
            "--center-x",
            "-1000",
            "--scale",
            "4",
            "--out",
            "b.png",
        ])
        .unwrap();
        assert_eq!(cli.common.seed, Some(-7));
        let Command::Biomes(args) = cli.command else {
            panic!("expected biomes command");
        };
        assert_eq!(args.center_x, -1000);
        assert_eq!(args.size, 512);
        assert_eq!(args.region().scale, 4);
    }

    #[test]
    fn test_parse_chunks_defaults() {
        let cli = Cli::try_parse_from(["loam-mapgen", "chunks"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Chunks {
                radius: 4,
                threads: None
            }
        ));
    }

    #[test]
    fn test_missing_output_is_an_error() {
        assert!(Cli::try_parse_from(["loam-mapgen", "rivers"]).is_err());
    }

    #[test]
    fn test_chunks_nearest_first() {
        let chunks = chunks_by_distance(2);
        assert_eq!(chunks.len(), 25);
        assert_eq!(chunks[0], ChunkPos::new(0, 0));
        assert!(chunks[1..5].iter().all(|c| c.x.abs() + c.z.abs() == 1));
        assert!(chunks_by_distance(-1).len() == 1);
    }

    #[test]
    fn test_generate_small_batch() {
        let generator = WorldGenerator::new(
            &Config::default(),
            Arc::new(NoiseClimateProvider::new(0)),
        )
        .unwrap();
        generate_chunks(Arc::new(generator), 0, Some(1)).unwrap();
    }
}
