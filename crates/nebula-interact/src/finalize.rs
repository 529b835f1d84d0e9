//! Applies decisions to events and commits terminal outcomes.
//!
//! All mutation of an [`InteractEvent`] by this crate happens here, through
//! one rule table, so the outcome of a decision does not depend on which
//! observer touched the event first.

use serde::Serialize;
use tracing::debug;

use crate::event::{ActorId, InteractAction, InteractEvent, UseResult};
use crate::host::InteractHost;
use crate::pipeline::{Evaluation, player_debug};
use crate::state::InteractionState;

/// Boost ticks granted per power level, counting the item itself as level 1.
pub const BOOST_TICKS_PER_POWER: u64 = 20;

/// Shortest boost window ever stamped.
pub const MIN_BOOST_TICKS: u64 = 30;

// ---------------------------------------------------------------------------
// Boost notification
// ---------------------------------------------------------------------------

/// Movement-boost window read by the movement subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoostWindow {
    /// Length of the last stamped boost.
    pub duration: u64,
    /// Tick at which the boost stops counting.
    pub expire_tick: u64,
}

impl BoostWindow {
    /// Whether the boost still applies at `tick`.
    pub fn is_active(&self, tick: u64) -> bool {
        self.duration > 0 && tick < self.expire_tick
    }
}

/// One-way notice that an item-assisted boost was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoostNotice {
    /// Who boosted.
    pub actor: ActorId,
    /// Item power level reported by the host.
    pub power: u32,
    /// Boost length in ticks.
    pub duration: u64,
    /// Tick at which the boost expires.
    pub expire_tick: u64,
}

/// Boost length for a given item power.
pub fn boost_duration(power: u32) -> u64 {
    ((1 + u64::from(power)) * BOOST_TICKS_PER_POWER).max(MIN_BOOST_TICKS)
}

// ---------------------------------------------------------------------------
// ResolutionFinalizer
// ---------------------------------------------------------------------------

/// Turns decisions into event mutations and records terminal outcomes.
pub struct ResolutionFinalizer;

impl ResolutionFinalizer {
    /// Applies a decision to the event, then records the resulting state.
    ///
    /// Rules, first match wins:
    /// - actor gate: deny block and item use, cancel
    /// - ender pearl restriction: deny item use (does not cancel)
    /// - denied and already cancelled: deny block use only
    /// - denied: cancel, deny block use, deny item use unless the item is
    ///   consumable and nothing demanded item suppression
    pub fn apply<H: InteractHost + ?Sized>(
        host: &H,
        event: &mut InteractEvent,
        evaluation: &Evaluation,
        state: &mut InteractionState,
    ) {
        let decision = evaluation.decision;
        let trace = &evaluation.trace;

        if decision.reason.is_actor_gate() {
            event.set_use_block(UseResult::Deny);
            event.set_use_item(UseResult::Deny);
            event.set_cancelled(true);
            state.record_resolution(event.resolution(), trace.tick);
            return;
        }

        if decision.restrict_item_use {
            event.set_use_item(UseResult::Deny);
        }

        if decision.denied {
            let message = if event.is_cancelled() {
                event.set_use_block(UseResult::Deny);
                "already cancelled: deny use block"
            } else {
                let previous_use_item = event.use_item();
                event.set_cancelled(true);
                event.set_use_block(UseResult::Deny);
                let consumable = event.item.is_some_and(|item| host.is_consumable(&item));
                if previous_use_item == UseResult::Deny || decision.prevent_item_use || !consumable
                {
                    event.set_use_item(UseResult::Deny);
                    "deny item use"
                } else {
                    event.set_use_item(UseResult::Allow);
                    "allow edible item use"
                }
            };
            player_debug(host, state, event, trace.previous_tick, trace.tick, message);
        }

        state.record_resolution(event.resolution(), trace.tick);
    }

    /// Terminal pass, run after every other observer.
    ///
    /// Records the event's final state and returns a boost notice when a
    /// boost item was used into the air. Calling it again for the same event
    /// changes nothing.
    pub fn finalize<H: InteractHost + ?Sized>(
        host: &H,
        event: &InteractEvent,
        state: &mut InteractionState,
        boost: &mut BoostWindow,
    ) -> Option<BoostNotice> {
        let now = host.current_tick();
        state.record_resolution(event.resolution(), now);

        if event.action != InteractAction::RightClickAir
            || !event.is_cancelled()
            || event.use_item() == UseResult::Deny
        {
            return None;
        }
        let item = event.item?;
        let power = host.classify_boost_item(event.actor, &item)?;
        if !state.claim_boost_notice() {
            return None;
        }

        let duration = boost_duration(power);
        let expire_tick = now + duration;
        *boost = BoostWindow {
            duration,
            expire_tick,
        };
        if state.debug_enabled() {
            debug!(actor = event.actor, power, duration, expire_tick, ?item, "Boost detected");
        }
        Some(BoostNotice {
            actor: event.actor,
            power,
            duration,
            expire_tick,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_duration() {
        assert_eq!(boost_duration(0), 30);
        assert_eq!(boost_duration(1), 40);
        assert_eq!(boost_duration(3), 80);
    }

    #[test]
    fn test_boost_window_expiry() {
        let window = BoostWindow {
            duration: 40,
            expire_tick: 140,
        };
        assert!(window.is_active(139));
        assert!(!window.is_active(140));
        assert!(!BoostWindow::default().is_active(0));
    }
}
