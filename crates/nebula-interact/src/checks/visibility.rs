//! Line-of-sight check using the DDA (Amanatides & Woo) voxel walk.
//!
//! Two rays are cast from the eye: one toward the block centre and one along
//! the best available look direction. The interaction is visible if either
//! ray reaches the target before any view-obstructing block.

use glam::{DVec3, IVec3};
use nebula_config::VisibilityConfig;

use super::{CheckKind, CheckRecord};
use crate::geometry::{Orientation, block_center};
use crate::host::BlockAccess;

/// Hard bound on voxels visited per ray.
const MAX_STEPS: usize = 256;

/// What a single ray ran into first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayOutcome {
    /// Reached the target block.
    Target,
    /// Stopped by another block.
    Obstructed(IVec3),
    /// Ran out of length without hitting anything.
    Clear,
}

/// Walks the voxel grid from `origin` along `direction` (normalised) for at
/// most `max_distance` blocks.
///
/// The target counts as a hit even when passable. The voxel containing the
/// origin is skipped unless it is the target.
pub fn walk_ray<W: BlockAccess + ?Sized>(
    world: &W,
    origin: DVec3,
    direction: DVec3,
    max_distance: f64,
    target: IVec3,
) -> RayOutcome {
    let mut voxel = origin.floor().as_ivec3();
    let sub = origin - voxel.as_dvec3();

    let step = IVec3::new(
        if direction.x >= 0.0 { 1 } else { -1 },
        if direction.y >= 0.0 { 1 } else { -1 },
        if direction.z >= 0.0 { 1 } else { -1 },
    );

    // Distance in t-units to cross one full voxel on each axis.
    let t_delta = DVec3::new(
        safe_inv(direction.x.abs()),
        safe_inv(direction.y.abs()),
        safe_inv(direction.z.abs()),
    );

    // Distance in t-units to the first voxel boundary on each axis.
    let mut t_max = DVec3::new(
        initial_t_max(sub.x, direction.x, t_delta.x),
        initial_t_max(sub.y, direction.y, t_delta.y),
        initial_t_max(sub.z, direction.z, t_delta.z),
    );

    let mut is_origin = true;
    for _ in 0..MAX_STEPS {
        if voxel == target {
            return RayOutcome::Target;
        }
        if !is_origin && world.obstructs_view(world.block_at(voxel)) {
            return RayOutcome::Obstructed(voxel);
        }
        is_origin = false;

        // Advance along the axis with the smallest t_max.
        let t = if t_max.x < t_max.y && t_max.x < t_max.z {
            voxel.x += step.x;
            let t = t_max.x;
            t_max.x += t_delta.x;
            t
        } else if t_max.y < t_max.z {
            voxel.y += step.y;
            let t = t_max.y;
            t_max.y += t_delta.y;
            t
        } else {
            voxel.z += step.z;
            let t = t_max.z;
            t_max.z += t_delta.z;
            t
        };

        if t > max_distance {
            return RayOutcome::Clear;
        }
    }
    RayOutcome::Clear
}

/// Safely compute 1.0 / x, clamping to `f64::MAX` when x ≈ 0.
fn safe_inv(x: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        f64::MAX
    } else {
        1.0 / x
    }
}

/// Compute the initial parametric distance to the first voxel boundary.
fn initial_t_max(sub: f64, dir_component: f64, t_delta: f64) -> f64 {
    if dir_component > 0.0 {
        (1.0 - sub) * t_delta
    } else if dir_component < 0.0 {
        sub * t_delta
    } else {
        f64::MAX
    }
}

/// Flags an interaction with a block hidden behind another one.
///
/// `measured` is the number of rays that reached the target (0, 1, or 2).
pub fn check_visibility<W: BlockAccess + ?Sized>(
    config: &VisibilityConfig,
    world: &W,
    eye: DVec3,
    look: Orientation,
    block: IVec3,
) -> CheckRecord {
    let to_center = block_center(block) - eye;
    let center_distance = to_center.length();

    let mut hits = 0.0;
    if center_distance <= f64::EPSILON
        || walk_ray(world, eye, to_center / center_distance, center_distance, block)
            == RayOutcome::Target
    {
        hits += 1.0;
    }
    if walk_ray(world, eye, look.forward(), config.max_ray_distance, block) == RayOutcome::Target {
        hits += 1.0;
    }

    CheckRecord::new(CheckKind::Visibility, hits == 0.0, hits, 1.0)
}
