//! Eye-to-block distance check.

use glam::{DVec3, IVec3};
use nebula_config::ReachConfig;

use super::{CheckKind, CheckRecord};
use crate::geometry::distance_to_block;

/// Slack added to the configured reach to absorb position sampling error.
pub const REACH_TOLERANCE: f64 = 1e-3;

/// Flags a block whose nearest point is farther from the eye than the
/// configured maximum.
pub fn check_reach(config: &ReachConfig, eye: DVec3, block: IVec3) -> CheckRecord {
    let distance = distance_to_block(eye, block);
    let limit = config.max_distance + REACH_TOLERANCE;
    CheckRecord::new(CheckKind::Reach, distance > limit, distance, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(max_distance: f64) -> ReachConfig {
        ReachConfig {
            enabled: true,
            max_distance,
        }
    }

    #[test]
    fn test_block_ahead_within_reach() {
        let record = check_reach(&config(6.0), DVec3::new(0.0, 64.0, 0.0), IVec3::new(0, 64, 5));
        assert!(!record.violated);
        assert!((record.measured - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let eye = DVec3::new(0.0, 64.0, 0.0);
        let block = IVec3::new(0, 64, 5);
        assert!(!check_reach(&config(4.9995), eye, block).violated);
        assert!(check_reach(&config(4.99), eye, block).violated);
    }

    #[test]
    fn test_eye_inside_block() {
        let record = check_reach(&config(0.5), DVec3::new(3.5, 10.5, 3.5), IVec3::new(3, 10, 3));
        assert_eq!(record.measured, 0.0);
        assert!(!record.violated);
    }

    proptest! {
        #[test]
        fn prop_single_crossing_along_ray(
            max in 1.0f64..8.0,
            dir in (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0),
            d1 in 0.0f64..20.0,
            d2 in 0.0f64..20.0,
        ) {
            let dir = DVec3::new(dir.0, dir.1, dir.2);
            prop_assume!(dir.length() > 1e-3);
            let dir = dir.normalize();
            let block = IVec3::new(0, 64, 0);
            let centre = DVec3::new(0.5, 64.5, 0.5);
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };

            let near = check_reach(&config(max), centre + dir * near, block);
            let far = check_reach(&config(max), centre + dir * far, block);
            // Moving the eye away along a ray never turns a fail into a pass.
            prop_assert!(!near.violated || far.violated);
            prop_assert!(near.measured <= far.measured + 1e-9);
        }
    }
}
