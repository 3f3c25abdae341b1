use std::collections::HashMap;

use crate::world::tuning::MELEE_RANGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u16);

/// Attack-range lookup for equipped weapons. The full item system lives
/// outside this core; only the range column is consumed here.
#[derive(Debug, Default)]
pub struct WeaponTable {
    ranges: HashMap<ItemId, i32>,
}

impl WeaponTable {
    pub fn insert(&mut self, item: ItemId, range: i32) {
        self.ranges.insert(item, range.max(MELEE_RANGE));
    }

    pub fn weapon_range(&self, item: ItemId) -> Option<i32> {
        self.ranges.get(&item).copied()
    }

    /// Range of the preferred tool: right hand first, then left, else
    /// melee reach.
    pub fn attack_range(&self, right_tool: Option<ItemId>, left_tool: Option<ItemId>) -> i32 {
        if let Some(range) = right_tool.and_then(|item| self.weapon_range(item)) {
            return range;
        }
        if let Some(range) = left_tool.and_then(|item| self.weapon_range(item)) {
            return range;
        }
        MELEE_RANGE
    }
}
