use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::entities::character::{
    Actor, CharacterBody, CharacterId, CharacterKind, Language, TargetRef,
};
use crate::entities::effects::EffectKind;
use crate::entities::monster::Monster;
use crate::entities::npc::Npc;
use crate::entities::player::{Player, PlayerCommand};
use crate::net::connection::{DisconnectReason, ServerEffect};
use crate::scripting::fighting::{FightingPolicy, StandardFighting};
use crate::scripting::hooks::ChatFilter;
use crate::telemetry::logging;
use crate::world::items::WeaponTable;
use crate::world::map::WorldMap;
use crate::world::position::{Direction, Position, Range, ALL_DIRECTIONS};
use crate::world::registry::Registry;
use crate::world::spawn::{IdAllocator, SpawnManager};
use crate::world::species::SpeciesTable;
use crate::world::tick::{CadenceTimer, WorldClock};
use crate::world::tuning::{
    ATTACK_FIGHT_COST, BASE_ATTACK_STRENGTH, DEFAULT_CLIENT_TIMEOUT_SECS, GFX_HIT,
    SPAWN_CHECK_SECONDS, STEP_COST, VIEW_BROADCAST_RANGE,
};

/// Deterministic roll source for wander directions and self-heal checks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorldRng {
    state: u64,
}

impl WorldRng {
    pub(crate) fn from_seed(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    pub(crate) fn uniform(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        let span = (max - min + 1) as u64;
        min + ((self.state >> 32) % span) as i32
    }

    pub(crate) fn direction(&mut self) -> Direction {
        ALL_DIRECTIONS[self.uniform(0, 7) as usize]
    }
}

/// The whole world a tick operates on. Every phase receives this context
/// explicitly; nothing in the crate reaches for global world state. The
/// server wraps it in a mutex and the tick thread, the scheduler and the
/// immediate command drain all serialize through that lock.
pub struct WorldState {
    pub clock: WorldClock,
    pub players: Registry<Player>,
    pub monsters: Registry<Monster>,
    pub npcs: Registry<Npc>,
    pub spawns: SpawnManager,
    pub species: SpeciesTable,
    pub weapons: WeaponTable,
    pub map: Box<dyn WorldMap>,
    pub fighting: Arc<dyn FightingPolicy>,
    pub chat_filter: Option<Arc<dyn ChatFilter>>,
    pub ids: IdAllocator,
    pub spawn_enabled: bool,
    pub client_timeout_secs: i64,
    pub(crate) spawn_timer: CadenceTimer,
    pub(crate) rng: WorldRng,
}

impl WorldState {
    pub fn new(map: Box<dyn WorldMap>, start_ms: u64) -> Self {
        Self {
            clock: WorldClock::new(start_ms),
            players: Registry::new(),
            monsters: Registry::new(),
            npcs: Registry::new(),
            spawns: SpawnManager::default(),
            species: SpeciesTable::default(),
            weapons: WeaponTable::default(),
            map,
            fighting: Arc::new(StandardFighting),
            chat_filter: None,
            ids: IdAllocator::starting_at(1),
            spawn_enabled: true,
            client_timeout_secs: DEFAULT_CLIENT_TIMEOUT_SECS,
            spawn_timer: CadenceTimer::new(SPAWN_CHECK_SECONDS * 1_000, start_ms),
            rng: WorldRng::from_seed(start_ms ^ 0x5851f42d4c957f2d),
        }
    }

    /// One world turn. Converts wall-clock drift into an action point
    /// budget and runs the three phases in fixed order: players, then
    /// monsters, then NPCs. Returns the budget applied; zero means the
    /// turn was skipped because no point had accrued yet.
    pub fn turn_the_world(&mut self, now_ms: u64) -> i64 {
        let budget = self.clock.available(now_ms);
        if budget <= 0 {
            return 0;
        }
        self.clock.consume(budget);
        let ap = budget.min(i64::from(i32::MAX)) as i32;
        self.check_players(ap, now_ms);
        self.check_monsters(ap, now_ms);
        self.check_npcs(ap, now_ms);
        budget
    }

    /// Player phase: keepalive enforcement, point regeneration and queued
    /// command execution. Players whose transport has gone offline are
    /// erased in a deferred pass after iteration.
    pub(crate) fn check_players(&mut self, ap: i32, now_ms: u64) {
        let now_secs = (now_ms / 1_000) as i64;
        let mut departed = Vec::new();
        for id in self.players.ids() {
            let Some(player) = self.players.get(id) else {
                continue;
            };
            if !player.connection.is_online() {
                logging::log_game(&format!(
                    "player {} ({}) left the world",
                    player.body.name, id.0
                ));
                departed.push(id);
                continue;
            }
            let delta = now_secs - player.last_keepalive;
            if !(0..=self.client_timeout_secs).contains(&delta) {
                logging::log_world(&format!(
                    "player {} ({}) timed out after {}s without keepalive",
                    player.body.name, id.0, delta
                ));
                player.connection.shutdown_send(ServerEffect::Disconnect {
                    reason: DisconnectReason::UnstableConnection,
                });
                continue;
            }
            if let Some(player) = self.players.get_mut(id) {
                player.body.increase_action_points(ap);
                player.body.increase_fight_points(ap);
                player.body.effects.advance(now_ms);
                if player.body.effects.is_active(EffectKind::Regenerating) {
                    player.body.heal(1);
                }
            }
            self.workout_player_commands(id);
        }
        for id in departed {
            if let Some(player) = self.players.erase(id) {
                self.broadcast_removed(id, player.body.position);
            }
        }
    }

    /// Drain and execute everything queued for one player. Called from
    /// the player phase and from the immediate drain loop between turns.
    pub fn workout_player_commands(&mut self, id: CharacterId) {
        let commands: Vec<PlayerCommand> = match self.players.get_mut(id) {
            Some(player) if player.connection.is_online() => {
                player.pending_commands.drain(..).collect()
            }
            _ => return,
        };
        for command in commands {
            self.execute_player_command(id, command);
        }
    }

    fn execute_player_command(&mut self, id: CharacterId, command: PlayerCommand) {
        match command {
            PlayerCommand::Talk { mode, text } => self.broadcast_text(id, &text, mode),
            PlayerCommand::Move(direction) => {
                self.move_player(id, direction);
            }
            PlayerCommand::Attack(target) => {
                self.player_attacks(id, target);
            }
        }
    }

    pub fn move_player(&mut self, id: CharacterId, direction: Direction) -> bool {
        let moved = {
            let map = self.map.as_ref();
            match self.players.get_mut(id) {
                Some(player) if player.body.can_act() => {
                    step_body(map, &mut player.body, direction)
                }
                _ => None,
            }
        };
        match moved {
            Some((from, to)) => {
                self.broadcast_moved(id, from, to);
                true
            }
            None => false,
        }
    }

    pub fn move_monster(&mut self, id: CharacterId, direction: Direction) -> bool {
        let moved = {
            let map = self.map.as_ref();
            match self.monsters.get_mut(id) {
                Some(monster) => step_body(map, &mut monster.body, direction),
                None => None,
            }
        };
        match moved {
            Some((from, to)) => {
                self.broadcast_moved(id, from, to);
                true
            }
            None => false,
        }
    }

    pub fn move_npc(&mut self, id: CharacterId, direction: Direction) -> bool {
        let moved = {
            let map = self.map.as_ref();
            match self.npcs.get_mut(id) {
                Some(npc) => step_body(map, &mut npc.body, direction),
                None => None,
            }
        };
        match moved {
            Some((from, to)) => {
                self.broadcast_moved(id, from, to);
                true
            }
            None => false,
        }
    }

    /// Candidates a monster may fight: live players in range plus live
    /// monsters of a different allegiance standing on a different field.
    pub fn get_targets_in_range(
        &self,
        center: Position,
        radius: i32,
        allegiance: u16,
    ) -> Vec<TargetRef> {
        let range = Range::planar(radius);
        let mut targets = self.players.refs_in_range(center, range, true);
        self.monsters.for_each(|monster| {
            if monster.is_alive()
                && monster.allegiance != allegiance
                && monster.position() != center
                && range.contains(center, monster.position())
            {
                targets.push(monster.target_ref());
            }
        });
        targets
    }

    /// A monster swings at its stored enemy. Clears the enemy and reports
    /// false when the enemy no longer resolves to a live character.
    pub fn character_attacks(&mut self, attacker: CharacterId) -> bool {
        let (enemy, strength) = match self.monsters.get(attacker) {
            Some(monster) => match monster.enemy_id {
                Some(enemy) => (enemy, monster.attack_strength),
                None => return false,
            },
            None => return false,
        };
        let Some(struck_at) = self.apply_damage(enemy, strength) else {
            if let Some(monster) = self.monsters.get_mut(attacker) {
                monster.enemy_id = None;
            }
            return false;
        };
        if let Some(monster) = self.monsters.get_mut(attacker) {
            monster.body.turn_toward(struck_at);
            monster.body.increase_fight_points(-ATTACK_FIGHT_COST);
        }
        self.broadcast_gfx(struck_at, VIEW_BROADCAST_RANGE, GFX_HIT);
        true
    }

    /// A player swings at a target in weapon reach. Slain monsters stay
    /// in the registry as dead until the monster phase reaps them.
    pub fn player_attacks(&mut self, id: CharacterId, target: CharacterId) -> bool {
        let (position, range) = match self.players.get(id) {
            Some(player) if player.body.can_attack() && player.body.can_fight() => (
                player.body.position,
                self.weapons
                    .attack_range(player.body.right_tool, player.body.left_tool),
            ),
            _ => return false,
        };
        let in_reach = match self.target_position(target) {
            Some(target_position) => Range::planar(range).contains(position, target_position),
            None => false,
        };
        if !in_reach {
            return false;
        }
        let Some(struck_at) = self.apply_damage(target, BASE_ATTACK_STRENGTH) else {
            return false;
        };
        if let Some(player) = self.players.get_mut(id) {
            player.body.turn_toward(struck_at);
            player.body.increase_fight_points(-ATTACK_FIGHT_COST);
        }
        self.broadcast_gfx(struck_at, VIEW_BROADCAST_RANGE, GFX_HIT);
        true
    }

    fn target_position(&self, id: CharacterId) -> Option<Position> {
        if let Some(player) = self.players.get(id) {
            return player.body.alive.then_some(player.body.position);
        }
        if let Some(monster) = self.monsters.get(id) {
            return monster.body.alive.then_some(monster.body.position);
        }
        None
    }

    fn apply_damage(&mut self, target: CharacterId, amount: i32) -> Option<Position> {
        if let Some(player) = self.players.get_mut(target) {
            if !player.body.alive {
                return None;
            }
            player.body.take_damage(amount);
            return Some(player.body.position);
        }
        if let Some(monster) = self.monsters.get_mut(target) {
            if !monster.body.alive {
                return None;
            }
            monster.body.take_damage(amount);
            return Some(monster.body.position);
        }
        None
    }

    /// Remove a dead monster from the world: registry erase, spawn slot
    /// release and client notification.
    pub fn kill_monster(&mut self, id: CharacterId) {
        let Some(monster) = self.monsters.erase(id) else {
            return;
        };
        if let Some(spawn) = monster.spawn_id {
            self.spawns.note_death(spawn, id);
        }
        logging::log_game(&format!(
            "monster {} ({}) died at ({},{},{})",
            monster.body.name,
            id.0,
            monster.body.position.x,
            monster.body.position.y,
            monster.body.position.z
        ));
        self.broadcast_removed(id, monster.body.position);
    }

    /// Move buffered spawns into the registry. New monsters become
    /// visible and scriptable only here, at the monster phase's end.
    pub(crate) fn commit_new_monsters(&mut self) {
        for monster in self.spawns.take_pending() {
            let id = monster.body.id;
            let position = monster.body.position;
            let race = monster.race;
            self.monsters.insert(monster);
            self.broadcast_appeared(id, position);
            if let Some(hooks) = self.species.hooks(race).cloned() {
                hooks.on_spawn(id);
            }
        }
    }

    pub(crate) fn broadcast_appeared(&self, id: CharacterId, position: Position) {
        self.send_to_players_in_view(position, |_| ServerEffect::CharacterAppeared {
            id,
            position,
        });
    }

    pub(crate) fn broadcast_removed(&self, id: CharacterId, position: Position) {
        self.send_to_players_in_view(position, |_| ServerEffect::CharacterRemoved {
            id,
            position,
        });
    }

    pub(crate) fn broadcast_moved(&self, id: CharacterId, from: Position, to: Position) {
        self.send_to_players_in_view(to, |_| ServerEffect::CharacterMoved { id, from, to });
    }

    pub(crate) fn broadcast_spin(&self, id: CharacterId, position: Position) {
        self.send_to_players_in_view(position, |_| ServerEffect::CharacterSpin { id });
    }

    fn send_to_players_in_view(
        &self,
        position: Position,
        effect: impl Fn(CharacterId) -> ServerEffect,
    ) {
        let range = Range::planar(VIEW_BROADCAST_RANGE);
        self.players.for_each(|player| {
            if range.contains(position, player.position()) {
                player.connection.send(effect(player.id()));
            }
        });
    }

    pub(crate) fn character_snapshot(
        &self,
        id: CharacterId,
    ) -> Option<(CharacterKind, Position, Language)> {
        let body = self.character_body(id)?;
        let kind = if self.players.contains(id) {
            CharacterKind::Player
        } else if self.monsters.contains(id) {
            CharacterKind::Monster
        } else {
            CharacterKind::Npc
        };
        Some((kind, body.position, body.active_language))
    }

    pub(crate) fn character_body(&self, id: CharacterId) -> Option<&CharacterBody> {
        if let Some(player) = self.players.get(id) {
            return Some(&player.body);
        }
        if let Some(monster) = self.monsters.get(id) {
            return Some(&monster.body);
        }
        self.npcs.get(id).map(|npc| &npc.body)
    }
}

/// One tile step shared by all three kinds: walkability check, position
/// and facing update, step cost.
fn step_body(
    map: &dyn WorldMap,
    body: &mut CharacterBody,
    direction: Direction,
) -> Option<(Position, Position)> {
    let from = body.position;
    let to = from.step(direction);
    if !map.is_walkable(to) {
        return None;
    }
    body.position = to;
    body.facing = direction;
    body.increase_action_points(-STEP_COST);
    Some((from, to))
}

/// Character ids whose queued commands should run between world turns
/// instead of waiting for the next player phase. Producers (the network
/// layer) push ids; the tick thread drains.
#[derive(Default)]
pub struct ImmediateCommandQueue {
    queue: Mutex<VecDeque<CharacterId>>,
}

impl ImmediateCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, id: CharacterId) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(id);
        }
    }

    pub fn len(&self) -> usize {
        match self.queue.lock() {
            Ok(queue) => queue.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop one id. The queue lock is held only for the dequeue itself so
    /// producers are never blocked behind world-lock work.
    fn pop(&self) -> Option<CharacterId> {
        match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        }
    }
}

/// Drain the immediate queue against the shared world. Each id is
/// dequeued outside the world lock, then its commands run under it.
pub fn process_immediate_commands(queue: &ImmediateCommandQueue, world: &Mutex<WorldState>) {
    while let Some(id) = queue.pop() {
        if let Ok(mut world) = world.lock() {
            world.workout_player_commands(id);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::entities::player::ClientLocale;
    use crate::net::connection::QueueConnection;
    use crate::world::map::GridMap;

    pub(crate) fn world() -> WorldState {
        WorldState::new(Box::new(GridMap::unbounded()), 0)
    }

    pub(crate) fn add_player(
        world: &mut WorldState,
        id: u32,
        position: Position,
    ) -> Arc<QueueConnection> {
        let connection = Arc::new(QueueConnection::new());
        let body = CharacterBody::new(CharacterId(id), format!("player {id}"), position);
        world.players.insert(Player::new(
            body,
            connection.clone(),
            ClientLocale::English,
            0,
        ));
        connection
    }

    pub(crate) fn add_monster(
        world: &mut WorldState,
        id: u32,
        position: Position,
        race: u16,
    ) -> CharacterId {
        let body = CharacterBody::new(CharacterId(id), format!("monster {id}"), position);
        let monster = Monster::new(body, crate::entities::monster::RaceId(race), None);
        world.monsters.insert(monster);
        CharacterId(id)
    }
}
