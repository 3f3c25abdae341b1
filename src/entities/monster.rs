use crate::entities::character::{Actor, CharacterBody, CharacterId, CharacterKind};
use crate::entities::route::Route;
use crate::world::position::Position;
use crate::world::spawn::SpawnPointId;
use crate::world::talk::TalkMode;

/// Species key into the monster definition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RaceId(pub u16);

#[derive(Debug)]
pub struct Monster {
    pub body: CharacterBody,
    pub race: RaceId,
    /// Monsters of the same allegiance never target each other.
    pub allegiance: u16,
    /// Weak back-reference to the spawn point that created this monster;
    /// `None` for script- or admin-created monsters.
    pub spawn_id: Option<SpawnPointId>,
    pub enemy_id: Option<CharacterId>,
    pub last_target_position: Position,
    pub last_target_seen: bool,
    pub on_route: bool,
    pub route: Route,
    pub attack_strength: i32,
    /// Text overheard through the proximity engine; consumed by scripts.
    pub heard: Vec<(TalkMode, String)>,
}

impl Monster {
    pub fn new(body: CharacterBody, race: RaceId, spawn_id: Option<SpawnPointId>) -> Self {
        let position = body.position;
        Self {
            body,
            race,
            allegiance: race.0,
            spawn_id,
            enemy_id: None,
            last_target_position: position,
            last_target_seen: false,
            on_route: false,
            route: Route::default(),
            attack_strength: 10,
            heard: Vec::new(),
        }
    }

    pub fn follow_route(&mut self, route: Route) {
        self.route = route;
        self.on_route = true;
    }
}

impl Actor for Monster {
    fn body(&self) -> &CharacterBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut CharacterBody {
        &mut self.body
    }

    fn kind(&self) -> CharacterKind {
        CharacterKind::Monster
    }
}
