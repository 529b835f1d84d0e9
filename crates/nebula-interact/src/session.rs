//! Per-player interaction sessions.
//!
//! A [`PlayerInteract`] is created the first time an actor's interaction is
//! processed and dropped when the actor leaves. The orientation queue is
//! shared with the network ingestion path through an `Arc`; everything else
//! belongs to the thread processing that actor's interaction events.
//!
//! The table never holds a map guard while an event is processed, and the
//! ingestion path never touches the player lock, so appends proceed while
//! the same actor's event is being decided.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::event::ActorId;
use crate::finalize::BoostWindow;
use crate::orientation::{OrientationHistoryQueue, OrientationSample};
use crate::state::InteractionState;

/// Everything the pipeline keeps for one actor.
pub struct PlayerInteract {
    /// Short-term interaction history.
    pub state: InteractionState,
    /// Buffered orientation reports, appended by the network path.
    pub queue: Arc<OrientationHistoryQueue>,
    /// Movement boost stamped by the terminal pass.
    pub boost: BoostWindow,
}

impl PlayerInteract {
    /// Fresh session state.
    pub fn new(queue_capacity: usize, debug: bool) -> Self {
        Self {
            state: InteractionState::new(debug),
            queue: Arc::new(OrientationHistoryQueue::new(queue_capacity)),
            boost: BoostWindow::default(),
        }
    }
}

/// Table entry: the ingestion side and the processing side of one session.
#[derive(Clone)]
struct SessionSlot {
    queue: Arc<OrientationHistoryQueue>,
    player: Arc<Mutex<PlayerInteract>>,
}

impl SessionSlot {
    fn new(queue_capacity: usize, debug: bool) -> Self {
        let player = PlayerInteract::new(queue_capacity, debug);
        Self {
            queue: Arc::clone(&player.queue),
            player: Arc::new(Mutex::new(player)),
        }
    }
}

/// All active sessions, keyed by actor.
pub struct SessionTable {
    sessions: DashMap<ActorId, SessionSlot>,
    queue_capacity: usize,
    debug: bool,
}

impl SessionTable {
    /// Creates an empty table. New sessions get `queue_capacity` orientation
    /// slots and per-player debug output set to `debug`.
    pub fn new(queue_capacity: usize, debug: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            queue_capacity,
            debug,
        }
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are active.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether `actor` has a session.
    pub fn contains(&self, actor: ActorId) -> bool {
        self.sessions.contains_key(&actor)
    }

    /// Creates the actor's session if absent.
    pub fn join(&self, actor: ActorId) {
        self.slot(actor);
    }

    fn slot(&self, actor: ActorId) -> SessionSlot {
        self.sessions
            .entry(actor)
            .or_insert_with(|| {
                info!(actor, "Interaction session created");
                SessionSlot::new(self.queue_capacity, self.debug)
            })
            .value()
            .clone()
    }

    /// Drops the actor's session, clearing its orientation queue for any
    /// ingestion path still holding it. Returns `false` if there was none.
    pub fn leave(&self, actor: ActorId) -> bool {
        match self.sessions.remove(&actor) {
            Some((_, slot)) => {
                slot.queue.clear();
                info!(actor, "Interaction session removed");
                true
            }
            None => false,
        }
    }

    /// Shared orientation queue of an active session. Never creates one.
    pub fn orientation_queue(&self, actor: ActorId) -> Option<Arc<OrientationHistoryQueue>> {
        self.sessions
            .get(&actor)
            .map(|slot| Arc::clone(&slot.queue))
    }

    /// Appends a decoded orientation report for the actor.
    ///
    /// Returns `None` when the actor has no session or the angles are not
    /// finite.
    pub fn record_orientation(&self, actor: ActorId, pitch: f32, yaw: f32) -> Option<u64> {
        let Some(queue) = self.orientation_queue(actor) else {
            debug!(actor, "Orientation dropped: no session");
            return None;
        };
        let sequence = queue.push(pitch, yaw);
        match sequence {
            Some(sequence) => debug!(actor, sequence, pitch, yaw, "Orientation recorded"),
            None => debug!(actor, pitch, yaw, "Orientation dropped: non-finite angles"),
        }
        sequence
    }

    /// Appends an already-sequenced orientation report. Reports for unknown
    /// actors and out-of-order or non-finite reports are dropped.
    pub fn record_orientation_sample(&self, actor: ActorId, sample: OrientationSample) -> bool {
        self.orientation_queue(actor)
            .is_some_and(|queue| queue.record(sample))
    }

    /// Runs `f` with the actor's session, creating it on first contact.
    pub fn with_player<R>(&self, actor: ActorId, f: impl FnOnce(&mut PlayerInteract) -> R) -> R {
        let player = self.slot(actor).player;
        let mut guard = player.lock();
        f(&mut *guard)
    }

    /// Turns per-player debug output on or off for an active session.
    pub fn set_debug(&self, actor: ActorId, enabled: bool) -> bool {
        let Some(player) = self
            .sessions
            .get(&actor)
            .map(|slot| Arc::clone(&slot.player))
        else {
            return false;
        };
        player.lock().state.set_debug(enabled);
        true
    }
}
