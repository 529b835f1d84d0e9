//! Block-space geometry shared by the interaction checks.
//!
//! Block `p` occupies `[p, p + 1)` on every axis. Angles are in degrees with
//! yaw 0 facing +Z, yaw 90 facing -X, and positive pitch looking down.

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

/// Radius of the sphere enclosing a unit block (half the cube diagonal).
pub const BLOCK_BOUNDING_RADIUS: f64 = 0.866_025_403_784_438_6;

/// A yaw/pitch pair in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Horizontal rotation in degrees.
    pub yaw: f32,
    /// Vertical rotation in degrees, positive is down.
    pub pitch: f32,
}

impl Orientation {
    /// Creates an orientation from yaw and pitch in degrees.
    pub const fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Returns `true` if both angles are finite.
    pub fn is_finite(self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }

    /// Unit look vector for this orientation.
    pub fn forward(self) -> DVec3 {
        let yaw = f64::from(self.yaw).to_radians();
        let pitch = f64::from(self.pitch).to_radians();
        DVec3::new(
            -yaw.sin() * pitch.cos(),
            -pitch.sin(),
            yaw.cos() * pitch.cos(),
        )
    }
}

/// Where an actor stands and looks, as the server currently believes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerPose {
    /// Feet position in block units.
    pub position: DVec3,
    /// Eye height above the feet.
    pub eye_height: f64,
    /// Last orientation reported with the event.
    pub orientation: Orientation,
}

impl PlayerPose {
    /// Creates a pose.
    pub fn new(position: DVec3, eye_height: f64, orientation: Orientation) -> Self {
        Self {
            position,
            eye_height,
            orientation,
        }
    }

    /// Eye position in block units.
    pub fn eye(&self) -> DVec3 {
        self.position + DVec3::new(0.0, self.eye_height, 0.0)
    }
}

/// Centre of the block volume.
pub fn block_center(block: IVec3) -> DVec3 {
    block.as_dvec3() + DVec3::splat(0.5)
}

/// Point of the block volume closest to `point`.
pub fn nearest_point_on_block(point: DVec3, block: IVec3) -> DVec3 {
    let min = block.as_dvec3();
    point.clamp(min, min + DVec3::ONE)
}

/// Euclidean distance from `point` to the block volume (0 inside it).
pub fn distance_to_block(point: DVec3, block: IVec3) -> f64 {
    point.distance(nearest_point_on_block(point, block))
}

/// Returns `true` if the ray from `origin` along `dir` touches the block
/// volume at a non-negative parameter (slab test, faces inclusive).
pub fn ray_intersects_block(origin: DVec3, dir: DVec3, block: IVec3) -> bool {
    if !origin.is_finite() || !dir.is_finite() {
        return false;
    }
    let min = block.as_dvec3();
    let max = min + DVec3::ONE;
    let mut t_enter = 0.0_f64;
    let mut t_exit = f64::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < f64::EPSILON {
            if o < min[axis] || o > max[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d;
        let a = (min[axis] - o) * inv;
        let b = (max[axis] - o) * inv;
        t_enter = t_enter.max(a.min(b));
        t_exit = t_exit.min(a.max(b));
        if t_enter > t_exit {
            return false;
        }
    }
    true
}

/// Manhattan distance between two block coordinates.
pub fn manhattan(a: IVec3, b: IVec3) -> u32 {
    let d = (a.as_i64vec3() - b.as_i64vec3()).abs();
    u32::try_from(d.x + d.y + d.z).unwrap_or(u32::MAX)
}
