use std::collections::BTreeMap;

use crate::entities::character::{Actor, CharacterId, TargetRef};
use crate::world::position::{Position, Range};

/// Per-kind entity container. The ordered map gives stable iteration: a
/// single pass visits each live entry exactly once. Phases never mutate
/// the structure mid-traversal; they snapshot `ids()` up front and apply
/// removals in a deferred pass, and the world mutex serializes structural
/// mutation against iteration.
#[derive(Debug, Default)]
pub struct Registry<T: Actor> {
    entries: BTreeMap<CharacterId, T>,
}

impl<T: Actor> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entity: T) -> Option<T> {
        self.entries.insert(entity.id(), entity)
    }

    pub fn erase(&mut self, id: CharacterId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: CharacterId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all ids; the per-entity work of a phase runs against
    /// this so erasures never invalidate an in-progress pass.
    pub fn ids(&self) -> Vec<CharacterId> {
        self.entries.keys().copied().collect()
    }

    pub fn for_each(&self, mut visit: impl FnMut(&T)) {
        for entity in self.entries.values() {
            visit(entity);
        }
    }

    pub fn for_each_mut(&mut self, mut visit: impl FnMut(&mut T)) {
        for entity in self.entries.values_mut() {
            visit(entity);
        }
    }

    pub fn ids_in_range(&self, center: Position, range: Range, alive_only: bool) -> Vec<CharacterId> {
        self.entries
            .values()
            .filter(|entity| !alive_only || entity.is_alive())
            .filter(|entity| range.contains(center, entity.position()))
            .map(|entity| entity.id())
            .collect()
    }

    pub fn refs_in_range(&self, center: Position, range: Range, alive_only: bool) -> Vec<TargetRef> {
        self.entries
            .values()
            .filter(|entity| !alive_only || entity.is_alive())
            .filter(|entity| range.contains(center, entity.position()))
            .map(|entity| entity.target_ref())
            .collect()
    }
}
