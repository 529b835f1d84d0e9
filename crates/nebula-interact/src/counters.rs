//! Diagnostic counters shared by every player's processing path.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// CounterKey
// ---------------------------------------------------------------------------

/// Outcome categories counted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterKey {
    /// Event denied because the actor was incapacitated.
    CancelDead,
    /// Allowed, judged with the orientation reported alongside the event.
    LookCurrent,
    /// Allowed, judged with the first buffered orientation sample.
    LookFlyingFirst,
    /// Allowed, judged with a later buffered orientation sample.
    LookFlyingOther,
    /// Reach check violations.
    ReachViolation,
    /// Direction check violations.
    DirectionViolation,
    /// Visibility check violations.
    VisibilityViolation,
    /// Speed check violations.
    SpeedViolation,
}

const KEY_COUNT: usize = 8;

impl CounterKey {
    /// Every key, in reporting order.
    pub const ALL: [CounterKey; KEY_COUNT] = [
        CounterKey::CancelDead,
        CounterKey::LookCurrent,
        CounterKey::LookFlyingFirst,
        CounterKey::LookFlyingOther,
        CounterKey::ReachViolation,
        CounterKey::DirectionViolation,
        CounterKey::VisibilityViolation,
        CounterKey::SpeedViolation,
    ];

    /// Stable dotted name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            CounterKey::CancelDead => "cancel.dead",
            CounterKey::LookCurrent => "block.interact.look.current",
            CounterKey::LookFlyingFirst => "block.interact.look.flying.first",
            CounterKey::LookFlyingOther => "block.interact.look.flying.other",
            CounterKey::ReachViolation => "block.interact.reach",
            CounterKey::DirectionViolation => "block.interact.direction",
            CounterKey::VisibilityViolation => "block.interact.visibility",
            CounterKey::SpeedViolation => "block.interact.speed",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// InteractCounters
// ---------------------------------------------------------------------------

/// Live counters bumped from any player's processing thread.
///
/// Uses atomics so concurrent players never contend on a lock.
pub struct InteractCounters {
    slots: [AtomicU64; KEY_COUNT],
}

impl InteractCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Add `amount` to a counter.
    pub fn add(&self, key: CounterKey, amount: u64) {
        self.slots[key.slot()].fetch_add(amount, Ordering::Relaxed);
    }

    /// Current value of a counter.
    pub fn get(&self, key: CounterKey) -> u64 {
        self.slots[key.slot()].load(Ordering::Relaxed)
    }

    /// Snapshot and reset all counters (swap with 0). Zero entries are left out.
    pub fn snapshot_and_reset(&self) -> BTreeMap<&'static str, u64> {
        CounterKey::ALL
            .iter()
            .filter_map(|&key| {
                let value = self.slots[key.slot()].swap(0, Ordering::Relaxed);
                (value > 0).then_some((key.name(), value))
            })
            .collect()
    }
}

impl Default for InteractCounters {
    fn default() -> Self {
        Self::new()
    }
}
