//! Configuration system for the Nebula interaction validator.
//!
//! Provides runtime-configurable check thresholds that persist to disk as RON
//! files. Supports CLI overrides via clap, hot-reload detection, range
//! validation at load time, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DirectionConfig, EnderPearlConfig, InteractConfig, ReachConfig,
    SpeedConfig, VisibilityConfig,
};
pub use error::ConfigError;
