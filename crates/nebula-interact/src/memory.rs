//! In-memory host used by the replay tool and tests.

use std::collections::{HashMap, HashSet};

use glam::{DVec3, IVec3};

use crate::checks::CheckKind;
use crate::event::{ActorId, BlockMaterial, ItemStack};
use crate::geometry::{Orientation, PlayerPose};
use crate::host::{BlockAccess, InteractHost};

/// Eye height used for actors without an explicit pose.
pub const DEFAULT_EYE_HEIGHT: f64 = 1.62;

/// Host backed by hash maps. Unset blocks are air.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    blocks: HashMap<IVec3, BlockMaterial>,
    passable: HashSet<BlockMaterial>,
    liquids: HashSet<BlockMaterial>,
    consumables: HashSet<u16>,
    ender_pearls: HashSet<u16>,
    boost_items: HashMap<u16, u32>,
    poses: HashMap<ActorId, PlayerPose>,
    incapacitated: HashSet<ActorId>,
    repositioning: HashSet<ActorId>,
    bypass: HashSet<(ActorId, CheckKind)>,
    tick: u64,
}

impl MemoryHost {
    /// Empty world at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a block. Setting air removes it.
    pub fn set_block(&mut self, pos: IVec3, material: BlockMaterial) {
        if material.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, material);
        }
    }

    /// Declares a material passable.
    pub fn mark_passable(&mut self, material: BlockMaterial) {
        self.passable.insert(material);
    }

    /// Declares a material liquid.
    pub fn mark_liquid(&mut self, material: BlockMaterial) {
        self.liquids.insert(material);
    }

    /// Declares an item id consumable.
    pub fn add_consumable(&mut self, item_id: u16) {
        self.consumables.insert(item_id);
    }

    /// Declares an item id an ender pearl.
    pub fn add_ender_pearl(&mut self, item_id: u16) {
        self.ender_pearls.insert(item_id);
    }

    /// Declares an item id a boost item with the given power.
    pub fn add_boost_item(&mut self, item_id: u16, power: u32) {
        self.boost_items.insert(item_id, power);
    }

    /// Sets an actor's pose.
    pub fn set_pose(&mut self, actor: ActorId, pose: PlayerPose) {
        self.poses.insert(actor, pose);
    }

    /// Updates only an actor's reported orientation.
    pub fn set_orientation(&mut self, actor: ActorId, orientation: Orientation) {
        let mut pose = self.pose(actor);
        pose.orientation = orientation;
        self.poses.insert(actor, pose);
    }

    /// Marks an actor dead (or alive again).
    pub fn set_incapacitated(&mut self, actor: ActorId, incapacitated: bool) {
        toggle(&mut self.incapacitated, actor, incapacitated);
    }

    /// Marks an actor as about to be set back.
    pub fn set_repositioning(&mut self, actor: ActorId, pending: bool) {
        toggle(&mut self.repositioning, actor, pending);
    }

    /// Exempts an actor from a check.
    pub fn grant_bypass(&mut self, actor: ActorId, check: CheckKind) {
        self.bypass.insert((actor, check));
    }

    /// Sets the clock.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Advances the clock.
    pub fn advance(&mut self, ticks: u64) {
        self.tick = self.tick.saturating_add(ticks);
    }
}

fn toggle<T: std::hash::Hash + Eq>(set: &mut HashSet<T>, value: T, on: bool) {
    if on {
        set.insert(value);
    } else {
        set.remove(&value);
    }
}

impl BlockAccess for MemoryHost {
    fn block_at(&self, pos: IVec3) -> BlockMaterial {
        self.blocks.get(&pos).copied().unwrap_or(BlockMaterial::AIR)
    }

    fn is_passable(&self, material: BlockMaterial) -> bool {
        material.is_air() || self.passable.contains(&material)
    }

    fn is_liquid(&self, material: BlockMaterial) -> bool {
        self.liquids.contains(&material)
    }
}

impl InteractHost for MemoryHost {
    fn pose(&self, actor: ActorId) -> PlayerPose {
        self.poses.get(&actor).copied().unwrap_or(PlayerPose::new(
            DVec3::ZERO,
            DEFAULT_EYE_HEIGHT,
            Orientation::default(),
        ))
    }

    fn is_actor_incapacitated(&self, actor: ActorId) -> bool {
        self.incapacitated.contains(&actor)
    }

    fn has_pending_forced_repositioning(&self, actor: ActorId) -> bool {
        self.repositioning.contains(&actor)
    }

    fn is_consumable(&self, item: &ItemStack) -> bool {
        self.consumables.contains(&item.id)
    }

    fn is_ender_pearl(&self, item: &ItemStack) -> bool {
        self.ender_pearls.contains(&item.id)
    }

    fn classify_boost_item(&self, _actor: ActorId, item: &ItemStack) -> Option<u32> {
        self.boost_items.get(&item.id).copied()
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn has_bypass(&self, actor: ActorId, check: CheckKind) -> bool {
        self.bypass.contains(&(actor, check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_blocks_are_air() {
        let mut host = MemoryHost::new();
        let pos = IVec3::new(1, 2, 3);
        assert!(host.block_at(pos).is_air());
        host.set_block(pos, BlockMaterial(4));
        assert_eq!(host.block_at(pos), BlockMaterial(4));
        host.set_block(pos, BlockMaterial::AIR);
        assert!(host.block_at(pos).is_air());
    }

    #[test]
    fn test_view_obstruction() {
        let mut host = MemoryHost::new();
        host.mark_passable(BlockMaterial(2));
        host.mark_liquid(BlockMaterial(3));
        assert!(!host.obstructs_view(BlockMaterial::AIR));
        assert!(!host.obstructs_view(BlockMaterial(2)));
        assert!(!host.obstructs_view(BlockMaterial(3)));
        assert!(host.obstructs_view(BlockMaterial(1)));
    }

    #[test]
    fn test_actor_flags_toggle() {
        let mut host = MemoryHost::new();
        host.set_incapacitated(1, true);
        assert!(host.is_actor_incapacitated(1));
        host.set_incapacitated(1, false);
        assert!(!host.is_actor_incapacitated(1));
        host.grant_bypass(1, CheckKind::Reach);
        assert!(host.has_bypass(1, CheckKind::Reach));
        assert!(!host.has_bypass(1, CheckKind::Speed));
    }
}
