//! The inbound interaction event and the value types it carries.
//!
//! The event is owned by the host. Several observers may inspect and mutate
//! it before it completes; this module only guarantees that a cancelled event
//! never keeps block use enabled.

use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Stable identity of a connected actor.
pub type ActorId = u64;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What the client reported doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractAction {
    /// Left click with nothing targeted.
    LeftClickAir,
    /// Right click with nothing targeted.
    RightClickAir,
    /// Left click on a block.
    LeftClickBlock,
    /// Right click on a block.
    RightClickBlock,
    /// Anything else (pressure plates, tripwires, farmland trampling).
    Physical,
}

impl InteractAction {
    /// Returns `true` for the four click kinds the checks understand.
    pub fn is_click(self) -> bool {
        !matches!(self, Self::Physical)
    }
}

/// The action remembered on the per-player interaction state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LastAction {
    /// No action recorded (or the last block was reset).
    #[default]
    None,
    /// Left click into the air.
    LeftAir,
    /// Right click into the air.
    RightAir,
    /// Left click on a block.
    LeftBlock,
    /// Right click on a block.
    RightBlock,
}

impl From<InteractAction> for LastAction {
    fn from(action: InteractAction) -> Self {
        match action {
            InteractAction::LeftClickAir => Self::LeftAir,
            InteractAction::RightClickAir => Self::RightAir,
            InteractAction::LeftClickBlock => Self::LeftBlock,
            InteractAction::RightClickBlock => Self::RightBlock,
            InteractAction::Physical => Self::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks and items
// ---------------------------------------------------------------------------

/// Compact block material identifier. `0` is air.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockMaterial(pub u16);

impl BlockMaterial {
    /// Empty space.
    pub const AIR: Self = Self(0);

    /// Returns `true` if this material is air.
    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// The face of a block that was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFace {
    /// -Y.
    Down,
    /// +Y.
    Up,
    /// -Z.
    North,
    /// +Z.
    South,
    /// -X.
    West,
    /// +X.
    East,
}

/// The block an event is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTarget {
    /// Block coordinate.
    pub position: IVec3,
    /// Clicked face.
    pub face: BlockFace,
}

/// Descriptor of the item in use. Classification is left to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Host item type identifier.
    pub id: u16,
    /// Stack size.
    pub count: u8,
}

impl ItemStack {
    /// Creates a stack.
    pub const fn new(id: u16, count: u8) -> Self {
        Self { id, count }
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Tri-state permission for using the block or the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseResult {
    /// Explicitly permitted.
    Allow,
    /// Explicitly denied.
    Deny,
    /// Left to the host's default behaviour.
    #[default]
    Default,
}

/// Snapshot of the three mutable outcome fields of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Whether the event is cancelled.
    pub cancelled: bool,
    /// Block-use permission.
    pub use_block: UseResult,
    /// Item-use permission.
    pub use_item: UseResult,
}

// ---------------------------------------------------------------------------
// InteractEvent
// ---------------------------------------------------------------------------

/// A single reported attempt by a client to use or touch a block or item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractEvent {
    /// Who did it.
    pub actor: ActorId,
    /// What kind of click.
    pub action: InteractAction,
    /// Targeted block, absent for air clicks.
    pub target: Option<BlockTarget>,
    /// Item in use, if any.
    pub item: Option<ItemStack>,
    cancelled: bool,
    use_block: UseResult,
    use_item: UseResult,
}

impl InteractEvent {
    /// Creates an uncancelled event with default permissions.
    pub fn new(actor: ActorId, action: InteractAction) -> Self {
        Self {
            actor,
            action,
            target: None,
            item: None,
            cancelled: false,
            use_block: UseResult::Default,
            use_item: UseResult::Default,
        }
    }

    /// Sets the targeted block.
    pub fn with_target(mut self, position: IVec3, face: BlockFace) -> Self {
        self.target = Some(BlockTarget { position, face });
        self
    }

    /// Sets the item in use.
    pub fn with_item(mut self, item: ItemStack) -> Self {
        self.item = Some(item);
        self
    }

    /// Marks the event as already cancelled by another observer, with the
    /// given item-use permission left in place.
    pub fn cancelled_by_host(mut self, use_item: UseResult) -> Self {
        self.set_cancelled(true);
        self.use_item = use_item;
        self
    }

    /// Whether the event is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Block-use permission.
    pub fn use_block(&self) -> UseResult {
        self.use_block
    }

    /// Item-use permission.
    pub fn use_item(&self) -> UseResult {
        self.use_item
    }

    /// Cancels or un-cancels. Cancelling always denies block use; un-cancelling
    /// turns a block denial back into the default.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
        if cancelled {
            self.use_block = UseResult::Deny;
        } else if self.use_block == UseResult::Deny {
            self.use_block = UseResult::Default;
        }
    }

    /// Sets block-use permission. Anything but `Deny` lifts a cancellation.
    pub fn set_use_block(&mut self, result: UseResult) {
        self.use_block = result;
        if result != UseResult::Deny {
            self.cancelled = false;
        }
    }

    /// Sets item-use permission.
    pub fn set_use_item(&mut self, result: UseResult) {
        self.use_item = result;
    }

    /// Current outcome fields.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            cancelled: self.cancelled,
            use_block: self.use_block,
            use_item: self.use_item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_denies_block_use() {
        let mut event = InteractEvent::new(1, InteractAction::RightClickBlock);
        event.set_use_block(UseResult::Allow);
        event.set_cancelled(true);
        assert!(event.is_cancelled());
        assert_eq!(event.use_block(), UseResult::Deny);
        // Item use is untouched by cancellation.
        assert_eq!(event.use_item(), UseResult::Default);
    }

    #[test]
    fn test_allowing_block_use_uncancels() {
        let mut event = InteractEvent::new(1, InteractAction::RightClickBlock)
            .cancelled_by_host(UseResult::Deny);
        event.set_use_block(UseResult::Allow);
        assert!(!event.is_cancelled());

        event.set_cancelled(true);
        event.set_cancelled(false);
        assert_eq!(event.use_block(), UseResult::Default);
    }

    #[test]
    fn test_last_action_mapping() {
        assert_eq!(LastAction::from(InteractAction::RightClickBlock), LastAction::RightBlock);
        assert_eq!(LastAction::from(InteractAction::LeftClickAir), LastAction::LeftAir);
        assert_eq!(LastAction::from(InteractAction::Physical), LastAction::None);
        assert!(!InteractAction::Physical.is_click());
    }
}
