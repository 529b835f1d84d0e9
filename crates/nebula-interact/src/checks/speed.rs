//! Interaction cadence check.

use nebula_config::SpeedConfig;

use super::{CheckKind, CheckRecord};
use crate::state::InteractionState;

/// Flags events arriving sooner than `min_interval_ticks` after the previous
/// decision. With a non-zero `burst`, that many early events are tolerated
/// before the next one fires.
///
/// The first event of a session (no previous tick) never fires.
pub fn check_speed(
    config: &SpeedConfig,
    state: &mut InteractionState,
    previous_tick: Option<u64>,
    now: u64,
) -> CheckRecord {
    let limit = f64::from(config.burst);
    let Some(previous) = previous_tick else {
        state.restart_interval();
        return CheckRecord::pass(CheckKind::Speed, 0.0, limit);
    };

    let elapsed = now.saturating_sub(previous);
    if elapsed >= config.min_interval_ticks {
        state.restart_interval();
        return CheckRecord::pass(CheckKind::Speed, 0.0, limit);
    }

    let count = state.bump_interval_events();
    CheckRecord::new(CheckKind::Speed, count > config.burst, f64::from(count), limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_interval_ticks: u64, burst: u32) -> SpeedConfig {
        SpeedConfig {
            enabled: true,
            min_interval_ticks,
            burst,
        }
    }

    #[test]
    fn test_first_event_passes() {
        let mut state = InteractionState::new(false);
        assert!(!check_speed(&config(5, 0), &mut state, None, 0).violated);
    }

    #[test]
    fn test_burst_within_interval() {
        let cfg = config(1, 2);
        let mut state = InteractionState::new(false);
        assert!(!check_speed(&cfg, &mut state, Some(9), 10).violated);
        assert!(!check_speed(&cfg, &mut state, Some(10), 10).violated);
        assert!(!check_speed(&cfg, &mut state, Some(10), 10).violated);
        let record = check_speed(&cfg, &mut state, Some(10), 10);
        assert!(record.violated);
        assert_eq!(record.measured, 3.0);

        // A quiet tick starts over.
        assert!(!check_speed(&cfg, &mut state, Some(10), 11).violated);
    }

    #[test]
    fn test_default_flags_second_event_in_same_tick() {
        let cfg = SpeedConfig::default();
        let mut state = InteractionState::new(false);
        assert!(!check_speed(&cfg, &mut state, Some(9), 10).violated);
        let record = check_speed(&cfg, &mut state, Some(10), 10);
        assert!(record.violated);
        assert_eq!(record.measured, 1.0);
    }

    #[test]
    fn test_zero_burst_flags_any_early_event() {
        let cfg = config(4, 0);
        let mut state = InteractionState::new(false);
        assert!(check_speed(&cfg, &mut state, Some(100), 102).violated);
        assert!(!check_speed(&cfg, &mut state, Some(100), 104).violated);
    }
}
