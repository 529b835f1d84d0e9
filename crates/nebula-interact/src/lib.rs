//! Server-side validation of client block interactions.
//!
//! Each interaction event a client reports is checked against the server's
//! own view of the actor: how far away the block is, whether the actor was
//! looking at it, whether anything stood in between, and how fast the actor
//! is clicking. Orientation reports buffered from the network stand in for
//! the view the client actually had, which absorbs latency jitter.
//!
//! Events go through two phases (see [`EventPhase`]): a decision phase that
//! runs the checks and applies the outcome to the event, and a terminal phase
//! that records the final outcome for the next event.

pub mod activation;
pub mod checks;
pub mod counters;
pub mod event;
pub mod finalize;
pub mod geometry;
pub mod host;
pub mod memory;
pub mod orientation;
pub mod phase;
pub mod pipeline;
pub mod session;
pub mod state;

pub use activation::{Activation, VersionSource, compare_versions, guess_usable_version};
pub use checks::{CheckGates, CheckKind, CheckRecord};
pub use counters::{CounterKey, InteractCounters};
pub use event::{
    ActorId, BlockFace, BlockMaterial, BlockTarget, InteractAction, InteractEvent, ItemStack,
    LastAction, Resolution, UseResult,
};
pub use finalize::{BoostNotice, BoostWindow, ResolutionFinalizer};
pub use geometry::{Orientation, PlayerPose};
pub use host::{BlockAccess, InteractHost};
pub use memory::MemoryHost;
pub use orientation::{
    LookSource, OrientationHistoryQueue, OrientationQueueHandle, OrientationSample,
};
pub use phase::{EventPhase, InteractPipeline, PhaseOutcome};
pub use pipeline::{
    DecisionTrace, DenyReason, Evaluation, Flow, ValidationDecision, ValidationPipeline,
};
pub use session::{PlayerInteract, SessionTable};
pub use state::InteractionState;
