//! Command-line argument parsing for the interaction validator tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments shared by the validator binaries.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "nebula-interact", about = "Nebula block-interaction validator")]
pub struct CliArgs {
    /// Scenario file to replay.
    pub scenario: Option<PathBuf>,

    /// Maximum reach distance in blocks.
    #[arg(long)]
    pub max_reach: Option<f64>,

    /// Base direction tolerance in degrees.
    #[arg(long)]
    pub direction_tolerance: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable per-player debug output for every session.
    #[arg(long)]
    pub debug: bool,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(reach) = args.max_reach {
            self.interact.reach.max_distance = reach;
        }
        if let Some(tolerance) = args.direction_tolerance {
            self.interact.direction.tolerance_deg = tolerance;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.debug {
            self.interact.debug = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            scenario: None,
            max_reach: None,
            direction_tolerance: None,
            log_level: None,
            debug: false,
            config: None,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            max_reach: Some(6.0),
            log_level: Some("trace".to_string()),
            debug: true,
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.interact.reach.max_distance, 6.0);
        assert_eq!(config.debug.log_level, "trace");
        assert!(config.interact.debug);
        // Non-overridden fields retain defaults
        assert_eq!(config.interact.direction.tolerance_deg, 30.0);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&empty_args());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "interact-replay",
            "scenario.ron",
            "--max-reach",
            "4.5",
            "--debug",
        ]);
        assert_eq!(args.scenario, Some(PathBuf::from("scenario.ron")));
        assert_eq!(args.max_reach, Some(4.5));
        assert!(args.debug);
    }
}
