//! The decision phase: runs the checks for one interaction event.
//!
//! [`ValidationPipeline::evaluate`] never touches the event. It reads the
//! event, updates the actor's [`InteractionState`], consults the orientation
//! history, and returns a [`ValidationDecision`] for the
//! [`ResolutionFinalizer`](crate::ResolutionFinalizer) to apply.
//!
//! Checks run in [`CheckKind::ORDER`]. The first violation short-circuits the
//! rest.

use std::sync::Arc;

use nebula_config::InteractConfig;
use serde::Serialize;
use tracing::debug;

use crate::checks::{
    CheckGates, CheckKind, CheckRecord, check_direction, check_reach, check_speed,
    check_visibility,
};
use crate::counters::{CounterKey, InteractCounters};
use crate::event::{ActorId, InteractAction, InteractEvent, UseResult};
use crate::host::InteractHost;
use crate::orientation::{LookSource, OrientationHistoryQueue, OrientationQueueHandle};
use crate::state::InteractionState;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Why an event was denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DenyReason {
    /// Not denied.
    #[default]
    None,
    /// The actor is dead or otherwise unable to act.
    Incapacitated,
    /// The actor is about to be snapped back to a server position.
    PendingRepositioning,
    /// Interacting too fast.
    Speed,
    /// Target out of reach.
    Reach,
    /// Not looking at the target.
    Direction,
    /// Target hidden behind other blocks.
    Visibility,
}

impl DenyReason {
    /// Reason matching a failed check.
    pub fn from_check(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Speed => Self::Speed,
            CheckKind::Reach => Self::Reach,
            CheckKind::Direction => Self::Direction,
            CheckKind::Visibility => Self::Visibility,
        }
    }

    /// Denials decided from the actor alone, before any check ran.
    pub fn is_actor_gate(self) -> bool {
        matches!(self, Self::Incapacitated | Self::PendingRepositioning)
    }
}

/// Outcome of the decision phase for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationDecision {
    /// Whether this pipeline wants the event denied.
    pub denied: bool,
    /// What caused the denial.
    pub reason: DenyReason,
    /// Deny item use no matter what the item is.
    pub prevent_item_use: bool,
    /// Deny item use even if the event is otherwise allowed (ender pearl
    /// thrown while clicking a solid block).
    pub restrict_item_use: bool,
}

impl ValidationDecision {
    /// Nothing to do.
    pub fn allow() -> Self {
        Self::default()
    }

    /// Denied for the given reason.
    pub fn deny(reason: DenyReason) -> Self {
        Self {
            denied: true,
            reason,
            prevent_item_use: false,
            restrict_item_use: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// How far the decision phase got.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Flow {
    /// Stopped at the actor gate.
    ActorGate,
    /// Not a click; nothing checked.
    Ignored,
    /// Pre-cancelled by another observer without item use allowed; left alone.
    Deferred,
    /// Pre-cancelled with item use allowed; block checks skipped.
    BlockChecksSkipped,
    /// Checks ran.
    #[default]
    Checked,
}

/// Diagnostic record of one decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionTrace {
    /// How far processing got.
    pub flow: Flow,
    /// Records of the checks that ran, in order.
    pub checks: Vec<CheckRecord>,
    /// Orientation the direction check settled on, if it ran.
    pub look_source: Option<LookSource>,
    /// Tick of the actor's previous recorded decision.
    pub previous_tick: Option<u64>,
    /// Tick the event was evaluated at.
    pub tick: u64,
}

/// Decision plus its trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// What to do with the event.
    pub decision: ValidationDecision,
    /// How it was reached.
    pub trace: DecisionTrace,
}

// ---------------------------------------------------------------------------
// ValidationPipeline
// ---------------------------------------------------------------------------

/// Runs the interaction checks against a host world.
pub struct ValidationPipeline {
    config: InteractConfig,
    gates: CheckGates,
    counters: Arc<InteractCounters>,
}

impl ValidationPipeline {
    /// Creates a pipeline with every check's capability gate open.
    pub fn new(config: InteractConfig, counters: Arc<InteractCounters>) -> Self {
        Self {
            config,
            gates: CheckGates::new(),
            counters,
        }
    }

    /// Replaces the capability gates.
    pub fn with_gates(mut self, gates: CheckGates) -> Self {
        self.gates = gates;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &InteractConfig {
        &self.config
    }

    /// Swaps in a new (already validated) configuration.
    pub fn set_config(&mut self, config: InteractConfig) {
        self.config = config;
    }

    /// Shared counters.
    pub fn counters(&self) -> &Arc<InteractCounters> {
        &self.counters
    }

    /// Whether `kind` runs for `actor`: enabled in config, capability
    /// available, and not bypassed by the host.
    pub fn is_check_enabled<H: InteractHost + ?Sized>(
        &self,
        host: &H,
        actor: ActorId,
        kind: CheckKind,
    ) -> bool {
        let enabled = match kind {
            CheckKind::Speed => self.config.speed.enabled,
            CheckKind::Reach => self.config.reach.enabled,
            CheckKind::Direction => self.config.direction.enabled,
            CheckKind::Visibility => self.config.visibility.enabled,
        };
        enabled && self.gates.is_available(kind) && !host.has_bypass(actor, kind)
    }

    /// Decides one event.
    ///
    /// Updates the actor's last block and speed bookkeeping. Never fails:
    /// missing data degrades to "not violated".
    pub fn evaluate<H: InteractHost + ?Sized>(
        &self,
        host: &H,
        event: &InteractEvent,
        state: &mut InteractionState,
        queue: &OrientationHistoryQueue,
    ) -> Evaluation {
        let previous_tick = state.begin_event();
        let now = host.current_tick();
        let actor = event.actor;
        let mut trace = DecisionTrace {
            previous_tick,
            tick: now,
            ..DecisionTrace::default()
        };

        if let Some(reason) = actor_gate(host, actor) {
            if reason == DenyReason::Incapacitated {
                self.counters.add(CounterKey::CancelDead, 1);
            }
            debug!(actor, ?reason, action = ?event.action, "Interaction denied before checks");
            trace.flow = Flow::ActorGate;
            return Evaluation {
                decision: ValidationDecision::deny(reason),
                trace,
            };
        }

        match event.target {
            Some(target) => state.set_last_block(target.position, event.action.into()),
            None => state.reset_last_block(),
        }

        if !event.action.is_click() {
            trace.flow = Flow::Ignored;
            return Evaluation {
                decision: ValidationDecision::allow(),
                trace,
            };
        }

        let mut block_checks = event.target.is_some();

        let mut decision = ValidationDecision::allow();
        if self.restricts_ender_pearl(host, event) {
            decision.restrict_item_use = true;
            player_debug(
                host,
                state,
                event,
                previous_tick,
                now,
                "click block: deny use ender pearl",
            );
        }

        if event.is_cancelled() && event.use_block() != UseResult::Allow {
            let use_item = if decision.restrict_item_use {
                UseResult::Deny
            } else {
                event.use_item()
            };
            if use_item != UseResult::Allow {
                trace.flow = Flow::Deferred;
                return Evaluation { decision, trace };
            }
            block_checks = false;
            trace.flow = Flow::BlockChecksSkipped;
        }

        let pose = host.pose(actor);
        let eye = pose.eye();
        let mut handle = OrientationQueueHandle::new(queue);
        let block = event.target.map(|t| t.position).filter(|_| block_checks);

        for kind in CheckKind::ORDER {
            if kind != CheckKind::Speed && block.is_none() {
                continue;
            }
            if !self.is_check_enabled(host, actor, kind) {
                continue;
            }

            let record = match (kind, block) {
                (CheckKind::Speed, _) => {
                    check_speed(&self.config.speed, state, previous_tick, now)
                }
                (CheckKind::Reach, Some(block)) => check_reach(&self.config.reach, eye, block),
                (CheckKind::Direction, Some(block)) => {
                    let (record, source) = check_direction(
                        &self.config.direction,
                        eye,
                        pose.orientation,
                        block,
                        &mut handle,
                    );
                    trace.look_source = Some(source);
                    record
                }
                (CheckKind::Visibility, Some(block)) => check_visibility(
                    &self.config.visibility,
                    host,
                    eye,
                    handle.best_orientation(pose.orientation),
                    block,
                ),
                _ => continue,
            };
            tracing::trace!(
                actor,
                check = kind.name(),
                violated = record.violated,
                measured = record.measured,
                limit = record.limit,
                "Check evaluated"
            );
            trace.checks.push(record);

            if record.violated {
                decision.denied = true;
                decision.reason = DenyReason::from_check(kind);
                decision.prevent_item_use = kind == CheckKind::Speed;
                self.counters.add(kind.violation_counter(), 1);
                let message = format!(
                    "{} violation ({:.3} > {:.3})",
                    kind.name(),
                    record.measured,
                    record.limit
                );
                player_debug(host, state, event, previous_tick, now, &message);
                break;
            }
        }

        if !decision.denied {
            self.count_look_source(&handle, state, actor);
        }

        Evaluation { decision, trace }
    }

    fn restricts_ender_pearl<H: InteractHost + ?Sized>(
        &self,
        host: &H,
        event: &InteractEvent,
    ) -> bool {
        let pearl = &self.config.ender_pearl;
        if event.action != InteractAction::RightClickBlock
            || !pearl.enabled
            || !pearl.prevent_click_block
        {
            return false;
        }
        if !event.item.is_some_and(|item| host.is_ender_pearl(&item)) {
            return false;
        }
        match event.target {
            None => true,
            Some(target) => !host.is_passable(host.block_at(target.position)),
        }
    }

    fn count_look_source(
        &self,
        handle: &OrientationQueueHandle<'_>,
        state: &InteractionState,
        actor: ActorId,
    ) {
        match handle.used() {
            Some((index, sample)) => {
                let key = if index == 0 {
                    CounterKey::LookFlyingFirst
                } else {
                    CounterKey::LookFlyingOther
                };
                self.counters.add(key, 1);
                if state.debug_enabled() {
                    debug!(
                        actor,
                        index,
                        sequence = sample.sequence(),
                        pitch = sample.pitch(),
                        yaw = sample.yaw(),
                        "Used queued orientation"
                    );
                }
            }
            None => self.counters.add(CounterKey::LookCurrent, 1),
        }
    }
}

fn actor_gate<H: InteractHost + ?Sized>(host: &H, actor: ActorId) -> Option<DenyReason> {
    if host.is_actor_incapacitated(actor) {
        Some(DenyReason::Incapacitated)
    } else if host.has_pending_forced_repositioning(actor) {
        Some(DenyReason::PendingRepositioning)
    } else {
        None
    }
}

/// Emits a rate-limited per-player debug line with block context.
pub(crate) fn player_debug<H: InteractHost + ?Sized>(
    host: &H,
    state: &mut InteractionState,
    event: &InteractEvent,
    previous_tick: Option<u64>,
    now: u64,
    message: &str,
) {
    let Some(skipped) = state.should_log(previous_tick, now) else {
        return;
    };
    let target = event.target;
    let material = target.map(|t| host.block_at(t.position).0);
    let last = target
        .map(|t| state.describe_last_block(t.position, event.action.into()))
        .unwrap_or_default();
    debug!(
        actor = event.actor,
        action = ?event.action,
        block = ?target.map(|t| t.position.to_array()),
        face = ?target.map(|t| t.face),
        material = ?material,
        cancelled = event.is_cancelled(),
        use_block = ?event.use_block(),
        use_item = ?event.use_item(),
        previous_tick = ?previous_tick,
        skipped,
        last = %last,
        "{message}"
    );
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
