use std::sync::Arc;

use crate::entities::character::{Actor, CharacterBody, CharacterKind};
use crate::entities::route::Route;
use crate::scripting::hooks::NpcScript;
use crate::world::talk::TalkMode;

pub struct Npc {
    pub body: CharacterBody,
    /// Optional attached script; an NPC without one simply stands around.
    pub script: Option<Arc<dyn NpcScript>>,
    pub on_route: bool,
    pub route: Route,
    pub heard: Vec<(TalkMode, String)>,
}

impl Npc {
    pub fn new(body: CharacterBody, script: Option<Arc<dyn NpcScript>>) -> Self {
        Self {
            body,
            script,
            on_route: false,
            route: Route::default(),
            heard: Vec::new(),
        }
    }

    pub fn follow_route(&mut self, route: Route) {
        self.route = route;
        self.on_route = true;
    }
}

impl Actor for Npc {
    fn body(&self) -> &CharacterBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut CharacterBody {
        &mut self.body
    }

    fn kind(&self) -> CharacterKind {
        CharacterKind::Npc
    }
}

impl std::fmt::Debug for Npc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Npc")
            .field("id", &self.body.id)
            .field("name", &self.body.name)
            .field("position", &self.body.position)
            .field("on_route", &self.on_route)
            .field("scripted", &self.script.is_some())
            .finish()
    }
}
