//! Two-phase event protocol.
//!
//! The host runs [`EventPhase::Decide`] when the event is first dispatched,
//! lets its other observers inspect and mutate the event, and then runs
//! [`EventPhase::Finalize`] last.

use serde::Serialize;

use crate::event::InteractEvent;
use crate::finalize::{BoostNotice, ResolutionFinalizer};
use crate::host::InteractHost;
use crate::pipeline::{Evaluation, ValidationPipeline};
use crate::session::PlayerInteract;

/// Ordered observer phases this crate takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventPhase {
    /// Checks run and the decision is applied.
    Decide,
    /// Terminal outcome recorded; boost detection.
    Finalize,
}

impl EventPhase {
    /// Phases in dispatch order.
    pub const ORDER: [EventPhase; 2] = [EventPhase::Decide, EventPhase::Finalize];
}

/// Result of running one phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    /// The decision phase ran.
    Decided(Evaluation),
    /// The terminal phase ran.
    Finalized(Option<BoostNotice>),
}

/// Validation pipeline plus finalizer, driven phase by phase.
pub struct InteractPipeline {
    validation: ValidationPipeline,
}

impl InteractPipeline {
    /// Wraps a validation pipeline.
    pub fn new(validation: ValidationPipeline) -> Self {
        Self { validation }
    }

    /// The decision engine.
    pub fn validation(&self) -> &ValidationPipeline {
        &self.validation
    }

    /// Mutable access, e.g. to swap in a reloaded config.
    pub fn validation_mut(&mut self) -> &mut ValidationPipeline {
        &mut self.validation
    }

    /// Runs one phase for an event.
    pub fn run_phase<H: InteractHost + ?Sized>(
        &self,
        phase: EventPhase,
        host: &H,
        event: &mut InteractEvent,
        player: &mut PlayerInteract,
    ) -> PhaseOutcome {
        match phase {
            EventPhase::Decide => PhaseOutcome::Decided(self.decide(host, event, player)),
            EventPhase::Finalize => PhaseOutcome::Finalized(self.finalize(host, event, player)),
        }
    }

    /// Decision phase: evaluate, then apply.
    pub fn decide<H: InteractHost + ?Sized>(
        &self,
        host: &H,
        event: &mut InteractEvent,
        player: &mut PlayerInteract,
    ) -> Evaluation {
        let evaluation = self
            .validation
            .evaluate(host, event, &mut player.state, &player.queue);
        ResolutionFinalizer::apply(host, event, &evaluation, &mut player.state);
        evaluation
    }

    /// Terminal phase.
    pub fn finalize<H: InteractHost + ?Sized>(
        &self,
        host: &H,
        event: &InteractEvent,
        player: &mut PlayerInteract,
    ) -> Option<BoostNotice> {
        ResolutionFinalizer::finalize(host, event, &mut player.state, &mut player.boost)
    }

    /// Runs every phase in order with `observers` standing in for the host's
    /// other listeners between them.
    pub fn process<H: InteractHost + ?Sized>(
        &self,
        host: &H,
        event: &mut InteractEvent,
        player: &mut PlayerInteract,
        observers: impl FnOnce(&mut InteractEvent),
    ) -> (Evaluation, Option<BoostNotice>) {
        let mut observers = Some(observers);
        let mut evaluation = Evaluation::default();
        let mut notice = None;
        for phase in EventPhase::ORDER {
            match self.run_phase(phase, host, event, player) {
                PhaseOutcome::Decided(decided) => {
                    evaluation = decided;
                    if let Some(observe) = observers.take() {
                        observe(event);
                    }
                }
                PhaseOutcome::Finalized(boost) => notice = boost,
            }
        }
        (evaluation, notice)
    }
}
