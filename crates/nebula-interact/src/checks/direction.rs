//! Looking-direction check.
//!
//! Judges against buffered orientation samples first, oldest unconsumed
//! first, and only falls back to the orientation reported with the event
//! when none of them fits.

use glam::{DVec3, IVec3};
use nebula_config::DirectionConfig;

use super::{CheckKind, CheckRecord};
use crate::geometry::{BLOCK_BOUNDING_RADIUS, Orientation, block_center, ray_intersects_block};
use crate::orientation::{LookSource, OrientationQueueHandle};

/// Largest possible deviation in degrees.
pub const MAX_DEVIATION: f64 = 180.0;

/// Angle in degrees by which the look ray misses the block.
///
/// Zero when the ray touches the block volume. Otherwise the angle between
/// the look vector and the vector to the block centre, less the angular
/// radius of the block's bounding sphere. A non-finite look vector counts as
/// [`MAX_DEVIATION`].
pub fn angular_deviation(eye: DVec3, forward: DVec3, block: IVec3) -> f64 {
    if !forward.is_finite() || forward.length_squared() <= f64::EPSILON {
        return MAX_DEVIATION;
    }
    if ray_intersects_block(eye, forward, block) {
        return 0.0;
    }
    let to_center = block_center(block) - eye;
    let distance = to_center.length();
    if distance <= f64::EPSILON {
        return 0.0;
    }
    let angle = forward.angle_between(to_center);
    let radius = (BLOCK_BOUNDING_RADIUS / distance).min(1.0).asin();
    (angle - radius).max(0.0).to_degrees()
}

/// Allowed deviation in degrees at the given eye-to-centre distance.
pub fn direction_tolerance(config: &DirectionConfig, distance: f64) -> f64 {
    config.tolerance_deg + config.distance_scale / distance.max(1.0)
}

/// Judges a single orientation.
pub fn judge_orientation(
    config: &DirectionConfig,
    eye: DVec3,
    orientation: Orientation,
    block: IVec3,
) -> CheckRecord {
    let deviation = angular_deviation(eye, orientation.forward(), block);
    let limit = direction_tolerance(config, eye.distance(block_center(block)));
    let violated = !orientation.is_finite() || deviation > limit;
    CheckRecord::new(CheckKind::Direction, violated, deviation, limit)
}

/// Runs the direction check for one event.
///
/// Buffered samples that do not fit are consumed so later checks in the same
/// event skip them. The first one that fits is marked used. Evicted entries
/// are skipped.
pub fn check_direction(
    config: &DirectionConfig,
    eye: DVec3,
    current: Orientation,
    block: IVec3,
    queue: &mut OrientationQueueHandle<'_>,
) -> (CheckRecord, LookSource) {
    let len = queue.fetch();
    let start = queue.first_usable_index().unwrap_or(0);

    for index in start..len {
        let Some(sample) = queue.sample_at(index) else {
            queue.consume_through(index);
            continue;
        };
        let record = judge_orientation(config, eye, sample.orientation(), block);
        if !record.violated {
            queue.mark_used(index, sample);
            return (record, LookSource::Queued { index, sample });
        }
        queue.consume_through(index);
    }

    (judge_orientation(config, eye, current, block), LookSource::Current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::OrientationHistoryQueue;

    fn config() -> DirectionConfig {
        DirectionConfig {
            enabled: true,
            tolerance_deg: 30.0,
            distance_scale: 2.0,
        }
    }

    const EYE: DVec3 = DVec3::new(0.0, 64.0, 0.0);

    #[test]
    fn test_block_straight_ahead_has_no_deviation() {
        let ahead = IVec3::new(0, 64, 5);
        let record = judge_orientation(&config(), EYE, Orientation::new(0.0, 0.0), ahead);
        assert_eq!(record.measured, 0.0);
        assert!(!record.violated);
    }

    #[test]
    fn test_block_off_axis_fails() {
        let off_axis = IVec3::new(5, 64, 5);
        let record = judge_orientation(&config(), EYE, Orientation::new(0.0, 0.0), off_axis);
        assert!(record.violated);
        assert!(record.measured > 35.0 && record.measured < 42.0, "{}", record.measured);
    }

    #[test]
    fn test_near_targets_get_more_tolerance() {
        let cfg = config();
        assert!(direction_tolerance(&cfg, 0.5) > direction_tolerance(&cfg, 4.0));
        assert_eq!(direction_tolerance(&cfg, 0.5), 32.0);
    }

    #[test]
    fn test_looking_away_is_large_deviation() {
        let block = IVec3::new(0, 64, 5);
        let to_center = block_center(block) - EYE;
        let radius = (BLOCK_BOUNDING_RADIUS / to_center.length()).asin();
        let expected = (DVec3::NEG_Z.angle_between(to_center) - radius).to_degrees();

        let deviation = angular_deviation(EYE, DVec3::NEG_Z, block);
        assert!(deviation > 150.0);
        assert!((deviation - expected).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_look_is_max_deviation() {
        let block = IVec3::new(0, 64, 5);
        let nan = DVec3::new(f64::NAN, f64::NAN, f64::NAN);
        assert_eq!(angular_deviation(EYE, nan, block), MAX_DEVIATION);
        assert_eq!(angular_deviation(EYE, DVec3::ZERO, block), MAX_DEVIATION);

        let record = judge_orientation(&config(), EYE, Orientation::new(f32::NAN, 0.0), block);
        assert!(record.violated);
        assert_eq!(record.measured, MAX_DEVIATION);
    }

    #[test]
    fn test_queued_sample_preferred_over_current() {
        let queue = OrientationHistoryQueue::new(4);
        // Looking away first, then at the block.
        queue.push(0.0, 180.0);
        queue.push(0.0, 0.0);
        let mut handle = OrientationQueueHandle::new(&queue);

        let current = Orientation::new(180.0, 0.0);
        let block = IVec3::new(0, 64, 5);
        let (record, source) = check_direction(&config(), EYE, current, block, &mut handle);
        assert!(!record.violated);
        assert!(matches!(source, LookSource::Queued { index: 1, .. }));
        assert_eq!(handle.first_usable_index(), Some(1));
        assert_eq!(handle.used().map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_falls_back_to_current_orientation() {
        let queue = OrientationHistoryQueue::new(4);
        queue.push(0.0, 180.0);
        let mut handle = OrientationQueueHandle::new(&queue);

        let (record, source) = check_direction(
            &config(),
            EYE,
            Orientation::new(0.0, 0.0),
            IVec3::new(0, 64, 5),
            &mut handle,
        );
        assert!(!record.violated);
        assert_eq!(source, LookSource::Current);
        assert_eq!(handle.first_usable_index(), Some(1));
        assert!(handle.used().is_none());
    }

    #[test]
    fn test_empty_queue_uses_current() {
        let queue = OrientationHistoryQueue::new(4);
        let mut handle = OrientationQueueHandle::new(&queue);
        let (record, source) = check_direction(
            &config(),
            EYE,
            Orientation::new(0.0, 0.0),
            IVec3::new(5, 64, 5),
            &mut handle,
        );
        assert!(record.violated);
        assert_eq!(source, LookSource::Current);
        assert!(handle.is_fetched());
    }
}
