//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level validator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Block-interaction check settings.
    pub interact: InteractConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Settings for the block-interaction validation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractConfig {
    /// Reach (distance) check.
    pub reach: ReachConfig,
    /// Looking-direction check.
    pub direction: DirectionConfig,
    /// Line-of-sight check.
    pub visibility: VisibilityConfig,
    /// Interaction frequency check.
    pub speed: SpeedConfig,
    /// Ender pearl right-click-block restriction.
    pub ender_pearl: EnderPearlConfig,
    /// Number of orientation samples kept per player.
    pub orientation_queue_capacity: usize,
    /// Default per-player debug logging for new sessions.
    pub debug: bool,
}

/// Reach check configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReachConfig {
    /// Run the check at all.
    pub enabled: bool,
    /// Maximum eye-to-block distance in blocks.
    pub max_distance: f64,
}

/// Direction check configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectionConfig {
    /// Run the check at all.
    pub enabled: bool,
    /// Base angular tolerance in degrees.
    pub tolerance_deg: f64,
    /// Extra tolerance in degree-blocks, divided by the target distance.
    /// Near targets get a larger allowance than far ones.
    pub distance_scale: f64,
}

/// Visibility check configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Run the check at all.
    pub enabled: bool,
    /// Length cap for the look-direction ray, in blocks.
    pub max_ray_distance: f64,
}

/// Speed check configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeedConfig {
    /// Run the check at all.
    pub enabled: bool,
    /// Minimum ticks between two interactions.
    pub min_interval_ticks: u64,
    /// Early interactions tolerated before flagging. 0 flags the first one.
    pub burst: u32,
}

/// Ender pearl restriction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnderPearlConfig {
    /// Master switch for ender pearl handling.
    pub enabled: bool,
    /// Deny throwing a pearl while right-clicking a non-passable block.
    pub prevent_click_block: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON log lines to a file in the log directory.
    pub file_logging: bool,
}

// --- Default implementations ---

impl Default for InteractConfig {
    fn default() -> Self {
        Self {
            reach: ReachConfig::default(),
            direction: DirectionConfig::default(),
            visibility: VisibilityConfig::default(),
            speed: SpeedConfig::default(),
            ender_pearl: EnderPearlConfig::default(),
            orientation_queue_capacity: 8,
            debug: false,
        }
    }
}

impl Default for ReachConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_distance: 5.2,
        }
    }
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_deg: 30.0,
            distance_scale: 2.0,
        }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_ray_distance: 8.0,
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ticks: 1,
            burst: 0,
        }
    }
}

impl Default for EnderPearlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prevent_click_block: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: false,
        }
    }
}

// --- Validation ---

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl InteractConfig {
    /// Rejects out-of-range or inconsistent thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reach = self.reach.max_distance;
        if !reach.is_finite() || reach <= 0.0 {
            return Err(invalid(
                "interact.reach.max_distance",
                format!("must be a positive number, got {reach}"),
            ));
        }

        let tolerance = self.direction.tolerance_deg;
        if !tolerance.is_finite() || tolerance <= 0.0 || tolerance > 180.0 {
            return Err(invalid(
                "interact.direction.tolerance_deg",
                format!("must be in (0, 180], got {tolerance}"),
            ));
        }

        let scale = self.direction.distance_scale;
        if !scale.is_finite() || scale < 0.0 {
            return Err(invalid(
                "interact.direction.distance_scale",
                format!("must be non-negative, got {scale}"),
            ));
        }

        let ray = self.visibility.max_ray_distance;
        if !ray.is_finite() || ray <= 0.0 {
            return Err(invalid(
                "interact.visibility.max_ray_distance",
                format!("must be a positive number, got {ray}"),
            ));
        }
        if self.visibility.enabled && self.reach.enabled && ray < reach {
            return Err(invalid(
                "interact.visibility.max_ray_distance",
                format!("shorter than reach.max_distance ({ray} < {reach})"),
            ));
        }

        if self.orientation_queue_capacity == 0 {
            return Err(invalid(
                "interact.orientation_queue_capacity",
                "must hold at least one sample",
            ));
        }

        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    ///
    /// A loaded file is validated before it is returned.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.interact.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    ///
    /// An edited file that fails validation is an error; the caller keeps
    /// running with `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            new_config.interact.validate()?;
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("max_distance: 5.2"));
        assert!(ron_str.contains("orientation_queue_capacity: 8"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().interact.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        // Only the reach threshold is given; everything else falls back.
        let ron_str = "(interact: (reach: (max_distance: 6.0)))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.interact.reach.max_distance, 6.0);
        assert!(config.interact.reach.enabled);
        assert_eq!(config.interact.speed, SpeedConfig::default());
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = InteractConfig::default();
        config.reach.max_distance = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "interact.reach.max_distance",
                ..
            })
        ));

        let mut config = InteractConfig::default();
        config.direction.tolerance_deg = 270.0;
        assert!(config.validate().is_err());

        let mut config = InteractConfig::default();
        config.direction.distance_scale = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = InteractConfig::default();
        config.orientation_queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ray_shorter_than_reach() {
        let mut config = InteractConfig::default();
        config.visibility.max_ray_distance = 3.0;
        assert!(config.validate().is_err());

        // Not inconsistent once visibility is off.
        config.visibility.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.interact.reach.max_distance = 4.5;
        config.interact.speed.burst = 2;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.ron"),
            "(interact: (reach: (max_distance: 0.0)))",
        )
        .unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.interact.direction.tolerance_deg = 45.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().interact.direction.tolerance_deg, 45.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
