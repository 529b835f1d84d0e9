//! Replays a scripted interaction scenario through the validation pipeline.
//!
//! ```text
//! interact-replay crates/nebula-interact/scenarios/basic.ron --max-reach 4.5 --debug
//! ```
//!
//! Every interaction runs through both event phases. Decisions are printed
//! one per line, followed by the counter totals.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use glam::{DVec3, IVec3};
use nebula_config::{CliArgs, Config, ConfigError};
use nebula_interact::{
    BlockFace, BlockMaterial, InteractAction, InteractCounters, InteractEvent, InteractPipeline,
    ItemStack, MemoryHost, Orientation, PlayerPose, SessionTable, UseResult, ValidationPipeline,
};
use serde::Deserialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("no scenario file given")]
    MissingScenario,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

// ---------------------------------------------------------------------------
// Scenario format
// ---------------------------------------------------------------------------

type Coord = (i32, i32, i32);

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Scenario {
    actor: u64,
    position: (f64, f64, f64),
    eye_height: f64,
    start_tick: u64,
    blocks: Vec<(Coord, u16)>,
    passable: Vec<u16>,
    liquid: Vec<u16>,
    consumable: Vec<u16>,
    ender_pearl: Vec<u16>,
    boost: Vec<(u16, u32)>,
    steps: Vec<Step>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            actor: 1,
            position: (0.0, 62.5, 0.0),
            eye_height: 1.62,
            start_tick: 0,
            blocks: Vec::new(),
            passable: Vec::new(),
            liquid: Vec::new(),
            consumable: Vec::new(),
            ender_pearl: Vec::new(),
            boost: Vec::new(),
            steps: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
enum Step {
    /// Orientation report arriving on the network path.
    Look { pitch: f32, yaw: f32 },
    /// Orientation the server currently holds for the actor.
    Turn { pitch: f32, yaw: f32 },
    /// Feet position.
    Move(f64, f64, f64),
    /// Advance the clock.
    Tick(u64),
    /// Place a block (0 removes it).
    SetBlock(Coord, u16),
    /// Actor dies or respawns.
    Dead(bool),
    /// One interaction event.
    Interact {
        action: InteractAction,
        #[serde(default)]
        target: Option<Coord>,
        #[serde(default)]
        item: Option<u16>,
        /// Pre-cancel the event with this item-use permission.
        #[serde(default)]
        cancelled_by_host: Option<UseResult>,
        /// Cancel the event between the two phases.
        #[serde(default)]
        cancel_after: bool,
    },
    /// Actor disconnects.
    Leave,
}

fn ivec(coord: Coord) -> IVec3 {
    IVec3::new(coord.0, coord.1, coord.2)
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

fn build_host(scenario: &Scenario) -> MemoryHost {
    let mut host = MemoryHost::new();
    for &(pos, material) in &scenario.blocks {
        host.set_block(ivec(pos), BlockMaterial(material));
    }
    for &id in &scenario.passable {
        host.mark_passable(BlockMaterial(id));
    }
    for &id in &scenario.liquid {
        host.mark_liquid(BlockMaterial(id));
    }
    for &id in &scenario.consumable {
        host.add_consumable(id);
    }
    for &id in &scenario.ender_pearl {
        host.add_ender_pearl(id);
    }
    for &(id, power) in &scenario.boost {
        host.add_boost_item(id, power);
    }
    let (x, y, z) = scenario.position;
    host.set_pose(
        scenario.actor,
        PlayerPose::new(DVec3::new(x, y, z), scenario.eye_height, Orientation::default()),
    );
    host.set_tick(scenario.start_tick);
    host
}

fn replay(config: &Config, scenario: &Scenario) {
    let counters = Arc::new(InteractCounters::new());
    let pipeline = InteractPipeline::new(ValidationPipeline::new(
        config.interact.clone(),
        Arc::clone(&counters),
    ));
    let sessions = SessionTable::new(
        config.interact.orientation_queue_capacity,
        config.interact.debug,
    );
    let mut host = build_host(scenario);
    let actor = scenario.actor;
    sessions.join(actor);

    for step in &scenario.steps {
        match step {
            Step::Look { pitch, yaw } => {
                sessions.record_orientation(actor, *pitch, *yaw);
            }
            Step::Turn { pitch, yaw } => {
                host.set_orientation(actor, Orientation::new(*yaw, *pitch));
            }
            Step::Move(x, y, z) => {
                let mut pose = nebula_interact::InteractHost::pose(&host, actor);
                pose.position = DVec3::new(*x, *y, *z);
                host.set_pose(actor, pose);
            }
            Step::Tick(ticks) => host.advance(*ticks),
            Step::SetBlock(pos, material) => host.set_block(ivec(*pos), BlockMaterial(*material)),
            Step::Dead(dead) => host.set_incapacitated(actor, *dead),
            Step::Interact {
                action,
                target,
                item,
                cancelled_by_host,
                cancel_after,
            } => {
                let mut event = InteractEvent::new(actor, *action);
                if let Some(pos) = target {
                    event = event.with_target(ivec(*pos), BlockFace::North);
                }
                if let Some(id) = item {
                    event = event.with_item(ItemStack::new(*id, 1));
                }
                if let Some(use_item) = cancelled_by_host {
                    event = event.cancelled_by_host(*use_item);
                }

                let (evaluation, notice) = sessions.with_player(actor, |player| {
                    pipeline.process(&host, &mut event, player, |event| {
                        if *cancel_after {
                            event.set_cancelled(true);
                        }
                    })
                });

                let decision = evaluation.decision;
                let checks: Vec<String> = evaluation
                    .trace
                    .checks
                    .iter()
                    .map(|r| {
                        let mark = if r.violated { "FAIL" } else { "ok" };
                        format!("{}={mark}({:.2}/{:.2})", r.kind.name(), r.measured, r.limit)
                    })
                    .collect();
                let resolution = event.resolution();
                println!(
                    "tick {:>5}  {:?} {:?} -> {} {:?} [{:?}] {}  \
                     cancelled={} block={:?} item={:?}",
                    evaluation.trace.tick,
                    action,
                    target,
                    if decision.denied { "DENY" } else { "allow" },
                    decision.reason,
                    evaluation.trace.flow,
                    checks.join(" "),
                    resolution.cancelled,
                    resolution.use_block,
                    resolution.use_item,
                );
                if let Some(notice) = notice {
                    println!(
                        "            boost power {} for {} ticks (expires at {})",
                        notice.power, notice.duration, notice.expire_tick
                    );
                }
            }
            Step::Leave => {
                sessions.leave(actor);
            }
        }
    }

    println!("counters:");
    for (name, value) in counters.snapshot_and_reset() {
        println!("  {name:<36} {value}");
    }
}

fn load_scenario(path: &Path) -> Result<Scenario, ReplayError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ron::from_str(&contents)?)
}

/// Loads the config named by the arguments, applies CLI overrides and
/// validates the result. A broken config file is an error, never a silent
/// fall back to defaults.
fn load_config(args: &CliArgs) -> Result<(Config, PathBuf), ReplayError> {
    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nebula-interact")
    });

    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);
    config.interact.validate()?;
    Ok((config, config_dir))
}

fn run(args: &CliArgs) -> Result<(), ReplayError> {
    let scenario_path = args.scenario.clone().ok_or(ReplayError::MissingScenario)?;
    let (config, config_dir) = load_config(args)?;

    let log_dir = config_dir.join("logs");
    nebula_log::init_logging(Some(&log_dir), config.debug.file_logging, Some(&config));

    let scenario = load_scenario(&scenario_path)?;
    if scenario.steps.is_empty() {
        warn!(path = %scenario_path.display(), "Scenario has no steps");
    }
    info!(
        path = %scenario_path.display(),
        steps = scenario.steps.len(),
        max_reach = config.interact.reach.max_distance,
        "Replaying scenario"
    );

    replay(&config, &scenario);
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("interact-replay: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parses_with_defaults() {
        let ron_str = r#"(
            blocks: [((0, 64, 5), 1)],
            steps: [
                Look(pitch: 0.0, yaw: 0.0),
                Tick(1),
                Interact(action: RightClickBlock, target: Some((0, 64, 5))),
                Leave,
            ],
        )"#;
        let scenario: Scenario = ron::from_str(ron_str).unwrap();
        assert_eq!(scenario.actor, 1);
        assert_eq!(scenario.steps.len(), 4);
        assert!(matches!(
            scenario.steps[2],
            Step::Interact {
                target: Some((0, 64, 5)),
                item: None,
                ..
            }
        ));
    }

    #[test]
    fn test_build_host_places_blocks() {
        let scenario = Scenario {
            blocks: vec![((1, 2, 3), 7)],
            start_tick: 40,
            ..Scenario::default()
        };
        let host = build_host(&scenario);
        assert_eq!(
            nebula_interact::BlockAccess::block_at(&host, IVec3::new(1, 2, 3)),
            BlockMaterial(7)
        );
        assert_eq!(nebula_interact::InteractHost::current_tick(&host), 40);
    }

    fn args_for(dir: &Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["interact-replay", "scenario.ron", "--config"];
        let dir = dir.to_str().unwrap();
        argv.push(dir);
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.ron"),
            "(interact: (direction: (tolerance_deg: 400.0)))",
        )
        .unwrap();

        let err = load_config(&args_for(dir.path(), &[])).unwrap_err();
        assert!(matches!(err, ReplayError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_unparsable_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "(interact: [").unwrap();

        let err = load_config(&args_for(dir.path(), &[])).unwrap_err();
        assert!(matches!(err, ReplayError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_cli_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = load_config(&args_for(dir.path(), &["--max-reach", "4.5"])).unwrap();
        assert_eq!(config.interact.reach.max_distance, 4.5);

        let err = load_config(&args_for(dir.path(), &["--max-reach=-1"])).unwrap_err();
        assert!(matches!(err, ReplayError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_bundled_scenario_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/basic.ron");
        let scenario = load_scenario(&path).unwrap();
        assert!(!scenario.steps.is_empty());
    }
}
