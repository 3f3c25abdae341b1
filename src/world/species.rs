use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::monster::RaceId;
use crate::scripting::hooks::MonsterHooks;

/// Static description of a monster species. The hooks handle is an
/// optional capability; call sites must branch on its absence.
#[derive(Clone)]
pub struct SpeciesDefinition {
    pub name: String,
    pub max_hitpoints: i32,
    pub attack_strength: i32,
    pub can_self_heal: bool,
    pub hooks: Option<Arc<dyn MonsterHooks>>,
}

impl SpeciesDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_hitpoints: 100,
            attack_strength: 10,
            can_self_heal: false,
            hooks: None,
        }
    }

    pub fn with_self_heal(mut self) -> Self {
        self.can_self_heal = true;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn MonsterHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

#[derive(Default)]
pub struct SpeciesTable {
    entries: HashMap<RaceId, SpeciesDefinition>,
}

impl SpeciesTable {
    pub fn insert(&mut self, race: RaceId, definition: SpeciesDefinition) {
        self.entries.insert(race, definition);
    }

    pub fn get(&self, race: RaceId) -> Option<&SpeciesDefinition> {
        self.entries.get(&race)
    }

    pub fn hooks(&self, race: RaceId) -> Option<&Arc<dyn MonsterHooks>> {
        self.entries.get(&race).and_then(|def| def.hooks.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for SpeciesDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeciesDefinition")
            .field("name", &self.name)
            .field("max_hitpoints", &self.max_hitpoints)
            .field("attack_strength", &self.attack_strength)
            .field("can_self_heal", &self.can_self_heal)
            .field("scripted", &self.hooks.is_some())
            .finish()
    }
}
