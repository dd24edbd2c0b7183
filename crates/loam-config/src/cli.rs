//! Command-line argument parsing shared by loam binaries.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Common loam command-line arguments.
///
/// CLI values override settings loaded from `config.ron`. Binaries embed
/// these with `#[command(flatten)]`.
#[derive(Args, Debug, Clone, Default)]
pub struct CliArgs {
    /// World seed.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Spawn search radius in blocks.
    #[arg(long)]
    pub spawn_distance: Option<u32>,

    /// Spawn search center, block X.
    #[arg(long, allow_negative_numbers = true)]
    pub spawn_center_x: Option<i32>,

    /// Spawn search center, block Z.
    #[arg(long, allow_negative_numbers = true)]
    pub spawn_center_z: Option<i32>,
}

impl CliArgs {
    /// Config directory to use: the `--config` override or the platform default.
    pub fn config_dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(crate::default_config_dir)
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(distance) = args.spawn_distance {
            self.spawn.spawn_distance = distance;
        }
        if let Some(x) = args.spawn_center_x {
            self.spawn.spawn_center_x = x;
        }
        if let Some(z) = args.spawn_center_z {
            self.spawn.spawn_center_z = z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CliArgs,
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(1234),
            spawn_center_z: Some(-300),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.seed, 1234);
        assert_eq!(config.spawn.spawn_center_z, -300);
        // Non-overridden fields retain defaults
        assert_eq!(config.spawn.spawn_distance, 8_000);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_negative_seed() {
        let cli = TestCli::try_parse_from(["loam", "--seed", "-42", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.common.seed, Some(-42));
        assert_eq!(cli.common.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_config_dir_override() {
        let args = CliArgs {
            config: Some(PathBuf::from("/tmp/loam-test")),
            ..Default::default()
        };
        assert_eq!(args.config_dir(), PathBuf::from("/tmp/loam-test"));
    }
}
