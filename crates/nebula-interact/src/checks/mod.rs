//! The four independent plausibility checks.
//!
//! Each check is a bounded computation over already-available state and
//! returns a [`CheckRecord`] with a definite verdict. Missing data never
//! fails a check.

mod direction;
mod reach;
mod speed;
mod visibility;

pub use direction::{angular_deviation, check_direction, direction_tolerance, judge_orientation};
pub use reach::{REACH_TOLERANCE, check_reach};
pub use speed::check_speed;
pub use visibility::{RayOutcome, check_visibility, walk_ray};

use serde::Serialize;

use crate::activation::Activation;
use crate::counters::CounterKey;

/// Identifies one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CheckKind {
    /// Interaction cadence.
    Speed,
    /// Eye-to-block distance.
    Reach,
    /// Looking direction.
    Direction,
    /// Line of sight.
    Visibility,
}

impl CheckKind {
    /// Evaluation order. Cheapest first, raycasting last.
    pub const ORDER: [CheckKind; 4] = [
        CheckKind::Speed,
        CheckKind::Reach,
        CheckKind::Direction,
        CheckKind::Visibility,
    ];

    /// Lower-case name used in log lines.
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Speed => "speed",
            CheckKind::Reach => "reach",
            CheckKind::Direction => "direction",
            CheckKind::Visibility => "visibility",
        }
    }

    /// Counter bumped when this check fires.
    pub fn violation_counter(self) -> CounterKey {
        match self {
            CheckKind::Speed => CounterKey::SpeedViolation,
            CheckKind::Reach => CounterKey::ReachViolation,
            CheckKind::Direction => CounterKey::DirectionViolation,
            CheckKind::Visibility => CounterKey::VisibilityViolation,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Verdict of one check plus the numbers it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckRecord {
    /// Which check ran.
    pub kind: CheckKind,
    /// Whether the interaction was judged implausible.
    pub violated: bool,
    /// Measured quantity (blocks, degrees, events, or ray hits).
    pub measured: f64,
    /// Threshold the measurement was compared with.
    pub limit: f64,
}

impl CheckRecord {
    /// A passing record.
    pub fn pass(kind: CheckKind, measured: f64, limit: f64) -> Self {
        Self {
            kind,
            violated: false,
            measured,
            limit,
        }
    }

    /// A record with the given verdict.
    pub fn new(kind: CheckKind, violated: bool, measured: f64, limit: f64) -> Self {
        Self {
            kind,
            violated,
            measured,
            limit,
        }
    }
}

/// Per-check capability gates, indexed by [`CheckKind`].
#[derive(Debug, Default)]
pub struct CheckGates {
    gates: [Activation; 4],
}

impl CheckGates {
    /// Every check available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the gate of one check.
    pub fn with(mut self, kind: CheckKind, activation: Activation) -> Self {
        self.gates[kind.slot()] = activation;
        self
    }

    /// Whether the check's capability conditions hold.
    pub fn is_available(&self, kind: CheckKind) -> bool {
        self.gates[kind.slot()].is_available()
    }
}
