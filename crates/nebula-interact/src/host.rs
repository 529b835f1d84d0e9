//! Queries the pipeline makes against the host world.
//!
//! Everything here is a pure, non-blocking lookup over state the host already
//! has in memory. The pipeline never caches the answers across events.

use glam::IVec3;

use crate::checks::CheckKind;
use crate::event::{ActorId, BlockMaterial, ItemStack};
use crate::geometry::PlayerPose;

/// Trait for looking up block data by coordinate.
///
/// Unloaded positions should report [`BlockMaterial::AIR`].
pub trait BlockAccess {
    /// Material at the given block coordinate.
    fn block_at(&self, pos: IVec3) -> BlockMaterial;

    /// Whether a material can be walked and seen through (flowers, torches, air).
    fn is_passable(&self, material: BlockMaterial) -> bool;

    /// Whether a material is a liquid.
    fn is_liquid(&self, material: BlockMaterial) -> bool;

    /// Returns `true` if the material stops a line-of-sight ray.
    fn obstructs_view(&self, material: BlockMaterial) -> bool {
        !material.is_air() && !self.is_passable(material) && !self.is_liquid(material)
    }
}

/// Actor, item, and clock queries needed to judge one interaction.
pub trait InteractHost: BlockAccess {
    /// Current server-side pose of the actor.
    fn pose(&self, actor: ActorId) -> PlayerPose;

    /// Dead or otherwise unable to act (e.g. non-positive health).
    fn is_actor_incapacitated(&self, actor: ActorId) -> bool;

    /// The actor is about to be snapped to a server-authoritative position.
    fn has_pending_forced_repositioning(&self, actor: ActorId) -> bool;

    /// Whether using the item means eating or drinking it.
    fn is_consumable(&self, item: &ItemStack) -> bool;

    /// Whether the item is a throwable ender pearl.
    fn is_ender_pearl(&self, _item: &ItemStack) -> bool {
        false
    }

    /// `Some(power)` if using the item in the air gives the actor a movement
    /// boost (e.g. a firework while gliding).
    fn classify_boost_item(&self, actor: ActorId, item: &ItemStack) -> Option<u32>;

    /// Monotonic logical clock.
    fn current_tick(&self) -> u64;

    /// Whether the actor is exempt from a single check.
    fn has_bypass(&self, _actor: ActorId, _check: CheckKind) -> bool {
        false
    }
}
