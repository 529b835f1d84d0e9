//! Per-player short-term interaction history.
//!
//! One [`InteractionState`] lives for each connected actor. It is only ever
//! touched by the thread that processes that actor's interaction events.

use glam::IVec3;

use crate::event::{LastAction, Resolution};
use crate::geometry::manhattan;

/// Short-term history of one actor's interactions.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    last_block: Option<IVec3>,
    last_action: LastAction,
    last_was_denied: bool,
    last_decision_tick: Option<u64>,
    denial_streak: u32,
    rate_limit_skips: u32,
    debug_enabled: bool,

    /// Incremented once per event by [`Self::begin_event`].
    event_serial: u64,
    /// Serial of the event whose resolution was last recorded.
    resolved_serial: Option<u64>,
    last_resolution: Option<Resolution>,
    /// `denial_streak` as it stood before the current event, so a resolution
    /// recorded twice for one event still counts once.
    streak_at_event_start: u32,
    /// Early events seen since the current speed interval opened.
    interval_events: u32,
    boost_notified_serial: Option<u64>,
}

impl InteractionState {
    /// Creates an empty state with per-player debug output on or off.
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            ..Self::default()
        }
    }

    /// Starts processing a new event.
    ///
    /// Clears the last block and returns the tick of the previous recorded
    /// decision, which the speed check and the log rate limit compare against.
    pub fn begin_event(&mut self) -> Option<u64> {
        self.event_serial = self.event_serial.wrapping_add(1);
        self.streak_at_event_start = self.denial_streak;
        self.reset_last_block();
        self.last_decision_tick
    }

    /// Forgets the last block and action.
    pub fn reset_last_block(&mut self) {
        self.last_block = None;
        self.last_action = LastAction::None;
    }

    /// Remembers the block and action of the current event together.
    pub fn set_last_block(&mut self, block: IVec3, action: LastAction) {
        self.last_block = Some(block);
        self.last_action = action;
    }

    /// Manhattan distance from the last block, or `None` if no last block is
    /// set. Diagnostic only.
    pub fn manhattan_distance_to_last(&self, block: IVec3) -> Option<u32> {
        self.last_block.map(|last| manhattan(last, block))
    }

    /// Commits the terminal outcome of the current event.
    ///
    /// Returns `false` and changes nothing when the same resolution has
    /// already been recorded for this event.
    pub fn record_resolution(&mut self, resolution: Resolution, tick: u64) -> bool {
        if self.resolved_serial == Some(self.event_serial)
            && self.last_resolution == Some(resolution)
        {
            return false;
        }

        self.resolved_serial = Some(self.event_serial);
        self.last_resolution = Some(resolution);
        self.last_was_denied = resolution.cancelled;
        self.last_decision_tick = Some(tick);
        self.denial_streak = if resolution.cancelled {
            self.streak_at_event_start.saturating_add(1)
        } else {
            0
        };
        true
    }

    /// Whether a per-player denial line may be logged now.
    ///
    /// Returns `None` if debug output is off or the line is suppressed because
    /// the previous decision was a denial in this very tick. Otherwise returns
    /// the number of lines suppressed since the last emitted one and resets it.
    pub fn should_log(&mut self, previous_tick: Option<u64>, now: u64) -> Option<u32> {
        if !self.debug_enabled {
            return None;
        }
        if previous_tick == Some(now) && self.last_was_denied && self.denial_streak > 0 {
            self.rate_limit_skips = self.rate_limit_skips.saturating_add(1);
            return None;
        }
        Some(std::mem::take(&mut self.rate_limit_skips))
    }

    /// Short description of how `block` relates to the remembered last block.
    pub fn describe_last_block(&self, block: IVec3, expected_action: LastAction) -> String {
        let mut out = match self.last_block {
            None => "no last block set!".to_string(),
            Some(last) if last == block => "same as last block.".to_string(),
            Some(last) => format!("last block differs, Manhattan: {}", manhattan(last, block)),
        };
        if self.last_was_denied {
            out.push_str(" / cancelled");
        }
        if self.last_action != expected_action {
            out.push_str(&format!(" / action={:?}", self.last_action));
        }
        out
    }

    /// Counts one more early event inside the current speed interval.
    pub fn bump_interval_events(&mut self) -> u32 {
        self.interval_events = self.interval_events.saturating_add(1);
        self.interval_events
    }

    /// Opens a new speed interval at the current event.
    pub fn restart_interval(&mut self) {
        self.interval_events = 0;
    }

    /// Returns `true` the first time it is called for the current event.
    pub fn claim_boost_notice(&mut self) -> bool {
        if self.boost_notified_serial == Some(self.event_serial) {
            return false;
        }
        self.boost_notified_serial = Some(self.event_serial);
        true
    }

    /// Enables or disables per-player debug output.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
    }

    /// Whether per-player debug output is on.
    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    /// Last block touched, if any.
    pub fn last_block(&self) -> Option<IVec3> {
        self.last_block
    }

    /// Action that went with [`Self::last_block`].
    pub fn last_action(&self) -> LastAction {
        self.last_action
    }

    /// Whether the last recorded resolution cancelled the event.
    pub fn last_was_denied(&self) -> bool {
        self.last_was_denied
    }

    /// Tick of the last recorded resolution.
    pub fn last_decision_tick(&self) -> Option<u64> {
        self.last_decision_tick
    }

    /// Consecutive cancelled resolutions.
    pub fn denial_streak(&self) -> u32 {
        self.denial_streak
    }

    /// Debug lines suppressed since the last emitted one.
    pub fn rate_limit_skips(&self) -> u32 {
        self.rate_limit_skips
    }

    /// Last recorded resolution.
    pub fn last_resolution(&self) -> Option<Resolution> {
        self.last_resolution
    }
}
