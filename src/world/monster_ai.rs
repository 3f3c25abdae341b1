//! Monster phase of the world turn: point regeneration, two-tier
//! targeting, route following, wandering and the spawn commit point.

use std::sync::Arc;

use crate::entities::character::{CharacterId, TargetRef};
use crate::entities::effects::EffectKind;
use crate::scripting::hooks::{MonsterHooks, TargetChoice};
use crate::telemetry::logging;
use crate::world::position::{Direction, Position};
use crate::world::spawn::SpawnPointId;
use crate::world::state::WorldState;
use crate::world::tuning::{
    GFX_SELF_HEAL, MONSTER_VIEW_RANGE, SELF_HEAL_AMOUNT, VIEW_BROADCAST_RANGE,
    WANDER_AWAY_PENALTY,
};

impl WorldState {
    /// Monster phase. Dead monsters are collected during the pass and
    /// removed afterward; monsters created by the spawn check become part
    /// of the world only at the commit point at the end of this phase.
    pub(crate) fn check_monsters(&mut self, ap: i32, now_ms: u64) {
        if self.spawn_timer.due(now_ms) {
            if self.spawn_enabled {
                self.spawns.tick(now_ms, &mut self.ids, &self.species);
            } else {
                logging::log_world("monster spawning is disabled, skipping repopulation");
            }
        }

        // Monsters regenerate slightly slower than players.
        let ap = if ap > 1 { ap - 1 } else { ap };

        let mut dead = Vec::new();
        for id in self.monsters.ids() {
            let Some(monster) = self.monsters.get_mut(id) else {
                continue;
            };
            if !monster.body.alive {
                dead.push(id);
                continue;
            }
            monster.body.increase_action_points(ap);
            monster.body.increase_fight_points(ap);
            monster.body.effects.advance(now_ms);
            if monster.body.effects.is_active(EffectKind::Regenerating) {
                monster.body.heal(1);
            }
            if !monster.body.can_act() {
                continue;
            }
            let race = monster.race;
            let on_route = monster.on_route;
            let species_known = self.species.get(race).is_some();
            if !species_known {
                logging::log_error(&format!(
                    "monster {} has no species definition for race {}",
                    id.0, race.0
                ));
            }
            if on_route {
                self.monster_route_turn(id, species_known);
            } else {
                self.monster_free_turn(id, species_known);
            }
        }
        for id in dead {
            self.kill_monster(id);
        }
        self.commit_new_monsters();
    }

    /// A monster's turn off route: fight whatever is in weapon reach,
    /// otherwise chase what is in view, otherwise head for the last known
    /// target position, otherwise wander.
    fn monster_free_turn(&mut self, id: CharacterId, species_known: bool) {
        if let Some(monster) = self.monsters.get_mut(id) {
            // Standing on the remembered spot clears the memory.
            if monster.body.position == monster.last_target_position {
                monster.last_target_seen = false;
            }
        }
        let Some(monster) = self.monsters.get(id) else {
            return;
        };
        let position = monster.body.position;
        let allegiance = monster.allegiance;
        let spawn_id = monster.spawn_id;
        let can_attack = monster.body.can_attack();
        let can_fight = monster.body.can_fight();
        let last_target_seen = monster.last_target_seen;
        let last_target_position = monster.last_target_position;
        let weapon_range = self
            .weapons
            .attack_range(monster.body.right_tool, monster.body.left_tool);
        let hooks = self.species.hooks(monster.race).cloned();

        let mut engaged = false;
        let near = self.get_targets_in_range(position, weapon_range, allegiance);
        if !near.is_empty() && can_attack {
            if let Some(target) = self.resolve_target(id, position, &near, &hooks, species_known) {
                if let Some(monster) = self.monsters.get_mut(id) {
                    monster.enemy_id = Some(target.id);
                    monster.last_target_position = target.position;
                    monster.last_target_seen = true;
                }
                if species_known {
                    if let Some(hooks) = &hooks {
                        if hooks.enemy_near(id, target.id) {
                            // Script took over the turn.
                            return;
                        }
                    }
                }
                if let Some(monster) = self.monsters.get_mut(id) {
                    monster.body.turn_toward(target.position);
                }
                // A swing at a stale enemy fails; fall back to the view
                // scan then, as if nothing had been in reach.
                engaged = if can_fight {
                    self.character_attacks(id)
                } else {
                    true
                };
            }
        }
        if engaged {
            return;
        }

        let seen = self.get_targets_in_range(position, MONSTER_VIEW_RANGE, allegiance);
        if !seen.is_empty() {
            if let Some(target) = self.resolve_target(id, position, &seen, &hooks, species_known) {
                if let Some(monster) = self.monsters.get_mut(id) {
                    monster.last_target_position = target.position;
                    monster.last_target_seen = true;
                }
                if species_known {
                    if let Some(hooks) = &hooks {
                        if hooks.enemy_on_sight(id, target.id) {
                            return;
                        }
                    }
                }
                self.step_toward(id, position, target.position);
                return;
            }
        } else if last_target_seen {
            self.step_toward(id, position, last_target_position);
            return;
        }
        self.monster_wanders(id, position, spawn_id, species_known);
    }

    /// A monster's turn on route: targets in reach or sight are reported
    /// to the species script but the route continues; a blocked step
    /// aborts the route.
    fn monster_route_turn(&mut self, id: CharacterId, species_known: bool) {
        let Some(monster) = self.monsters.get(id) else {
            return;
        };
        let position = monster.body.position;
        let allegiance = monster.allegiance;
        let finished = monster.route.is_empty();
        let weapon_range = self
            .weapons
            .attack_range(monster.body.right_tool, monster.body.left_tool);
        let hooks = self.species.hooks(monster.race).cloned();

        // A walked-out route ends quietly, without the abort hook.
        if finished {
            if let Some(monster) = self.monsters.get_mut(id) {
                monster.on_route = false;
            }
            return;
        }

        if species_known && hooks.is_some() {
            // Both scans run every turn on a route; an adjacent enemy is
            // reported through both hooks.
            let near = self.get_targets_in_range(position, weapon_range, allegiance);
            if let Some(target) = self.resolve_target(id, position, &near, &hooks, species_known) {
                if let Some(hooks) = &hooks {
                    hooks.enemy_near(id, target.id);
                }
            }
            let seen = self.get_targets_in_range(position, MONSTER_VIEW_RANGE, allegiance);
            if let Some(target) = self.resolve_target(id, position, &seen, &hooks, species_known) {
                if let Some(hooks) = &hooks {
                    hooks.enemy_on_sight(id, target.id);
                }
            }
        }

        if !self.advance_monster_route(id) {
            if let Some(monster) = self.monsters.get_mut(id) {
                monster.on_route = false;
                monster.route.clear();
            }
            if species_known {
                if let Some(hooks) = &hooks {
                    hooks.abort_route(id);
                }
            }
        }
    }

    /// Species script first; the default fighting policy governs when the
    /// script declines or the species has none.
    fn resolve_target(
        &self,
        id: CharacterId,
        position: Position,
        candidates: &[TargetRef],
        hooks: &Option<Arc<dyn MonsterHooks>>,
        species_known: bool,
    ) -> Option<TargetRef> {
        if candidates.is_empty() {
            return None;
        }
        if species_known {
            if let Some(hooks) = hooks {
                match hooks.set_target(id, candidates) {
                    TargetChoice::Target(target) => return Some(target),
                    TargetChoice::NoTarget => return None,
                    TargetChoice::NotHandled => {}
                }
            }
        }
        self.fighting.select_target(id, position, candidates)
    }

    fn step_toward(&mut self, id: CharacterId, from: Position, goal: Position) {
        if let Some(direction) = Direction::toward(from, goal) {
            self.move_monster(id, direction);
        }
    }

    /// No target anywhere: a rare self-heal for species that can, else a
    /// random step kept inside the spawn territory by mirroring the step
    /// direction at the border, with an extra point charge.
    fn monster_wanders(
        &mut self,
        id: CharacterId,
        position: Position,
        spawn_id: Option<SpawnPointId>,
        species_known: bool,
    ) {
        let can_self_heal = species_known
            && self
                .monsters
                .get(id)
                .and_then(|monster| self.species.get(monster.race))
                .map(|definition| definition.can_self_heal)
                .unwrap_or(false);
        if self.rng.uniform(1, 25) <= 5 && can_self_heal {
            if let Some(monster) = self.monsters.get_mut(id) {
                monster.body.heal(SELF_HEAL_AMOUNT);
            }
            self.broadcast_gfx(position, VIEW_BROADCAST_RANGE, GFX_SELF_HEAL);
            return;
        }
        let mut direction = self.rng.direction();
        if let Some(point) = spawn_id.and_then(|spawn| self.spawns.point(spawn)) {
            // The candidate field decides the mirroring; the x reflection
            // is applied first, the y check is independent of it.
            let candidate = position.step(direction);
            if (candidate.x - point.center.x).abs() > point.radius {
                direction = direction.mirror_x();
            }
            if (candidate.y - point.center.y).abs() > point.radius {
                direction = direction.mirror_y();
            }
        }
        self.move_monster(id, direction);
        if let Some(monster) = self.monsters.get_mut(id) {
            monster.body.increase_action_points(-WANDER_AWAY_PENALTY);
        }
    }

    fn advance_monster_route(&mut self, id: CharacterId) -> bool {
        let (from, goal) = match self.monsters.get(id) {
            Some(monster) => match monster.route.next_waypoint() {
                Some(goal) => (monster.body.position, goal),
                None => return false,
            },
            None => return false,
        };
        let Some(direction) = Direction::toward(from, goal) else {
            if let Some(monster) = self.monsters.get_mut(id) {
                monster.route.arrive_at(from);
            }
            return true;
        };
        if !self.move_monster(id, direction) {
            return false;
        }
        if let Some(monster) = self.monsters.get_mut(id) {
            let position = monster.body.position;
            monster.route.arrive_at(position);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::entities::character::{CharacterId, CharacterKind, TargetRef};
    use crate::entities::monster::RaceId;
    use crate::entities::route::Route;
    use crate::persistence::spawns::{SpawnEntryRow, SpawnLoadError, SpawnPointRow, SpawnStore};
    use crate::scripting::hooks::{MonsterHooks, TargetChoice};
    use crate::world::position::Position;
    use crate::world::species::SpeciesDefinition;
    use crate::world::state::test_support::{add_monster, add_player, world};

    fn at(x: i32, y: i32) -> Position {
        Position { x, y, z: 0 }
    }

    fn ready(world: &mut crate::world::state::WorldState, id: u32) {
        if let Some(monster) = world.monsters.get_mut(CharacterId(id)) {
            monster.body.increase_action_points(1_000);
            monster.body.increase_fight_points(1_000);
        }
    }

    #[test]
    fn budget_above_one_is_reduced_for_monsters() {
        let mut world = world();
        add_monster(&mut world, 10, at(0, 0), 7);
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));

        world.check_monsters(5, 1_000);
        assert_eq!(
            world.monsters.get(CharacterId(10)).map(|m| m.body.action_points),
            Some(4)
        );

        world.check_monsters(1, 2_000);
        assert_eq!(
            world.monsters.get(CharacterId(10)).map(|m| m.body.action_points),
            Some(5)
        );
    }

    #[test]
    fn adjacent_player_is_attacked() {
        let mut world = world();
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));
        add_player(&mut world, 1, at(1, 0));
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);

        world.check_monsters(1, 1_000);

        let player_hp = world
            .players
            .get(CharacterId(1))
            .map(|p| p.body.hitpoints)
            .expect("player");
        assert!(player_hp < 100);
        let monster = world.monsters.get(CharacterId(10)).expect("monster");
        assert_eq!(monster.enemy_id, Some(CharacterId(1)));
        assert!(monster.last_target_seen);
        assert_eq!(monster.last_target_position, at(1, 0));
    }

    #[test]
    fn player_in_view_but_out_of_reach_is_chased() {
        let mut world = world();
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));
        add_player(&mut world, 1, at(5, 0));
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);

        world.check_monsters(1, 1_000);

        let monster = world.monsters.get(CharacterId(10)).expect("monster");
        assert_eq!(monster.body.position, at(1, 0));
        assert!(monster.enemy_id.is_none());
        assert!(monster.last_target_seen);
        // No one got hurt at chase distance.
        assert_eq!(
            world.players.get(CharacterId(1)).map(|p| p.body.hitpoints),
            Some(100)
        );
    }

    #[test]
    fn wandering_stays_inside_the_spawn_territory() {
        struct OnePoint;
        impl SpawnStore for OnePoint {
            fn load_spawn_points(&self) -> Result<Vec<SpawnPointRow>, SpawnLoadError> {
                Ok(vec![SpawnPointRow {
                    id: 1,
                    x: 0,
                    y: 0,
                    z: 0,
                    radius: 3,
                    spawn_radius: 0,
                    min_delay_secs: 3_600,
                    max_delay_secs: 3_600,
                    spawn_all: false,
                    entries: vec![SpawnEntryRow { race: 7, count: 0 }],
                }])
            }
        }

        let mut world = world();
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));
        assert!(world.spawns.load(&OnePoint));
        add_monster(&mut world, 10, at(3, 3), 7);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.spawn_id = Some(crate::world::spawn::SpawnPointId(1));
        }

        for round in 0..200u64 {
            ready(&mut world, 10);
            world.check_monsters(1, round * 1_000);
            let position = world
                .monsters
                .get(CharacterId(10))
                .map(|m| m.body.position)
                .expect("monster");
            assert!(position.x.abs() <= 3, "escaped on x at {position:?}");
            assert!(position.y.abs() <= 3, "escaped on y at {position:?}");
        }
    }

    #[test]
    fn self_healing_species_sometimes_heals_instead_of_wandering() {
        let mut world = world();
        world
            .species
            .insert(RaceId(7), SpeciesDefinition::new("troll").with_self_heal());
        add_monster(&mut world, 10, at(0, 0), 7);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.body.take_damage(50);
        }

        let mut healed = false;
        for round in 0..200u64 {
            ready(&mut world, 10);
            world.check_monsters(1, round * 1_000);
            let hp = world
                .monsters
                .get(CharacterId(10))
                .map(|m| m.body.hitpoints)
                .expect("monster");
            if hp > 50 {
                healed = true;
                break;
            }
        }
        assert!(healed, "the 1-in-5 heal roll never landed in 200 turns");
    }

    #[test]
    fn wander_steps_cost_extra_but_approach_steps_do_not() {
        let mut world = world();
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));

        // Approach: a target in view, outside reach.
        add_player(&mut world, 1, at(5, 0));
        add_monster(&mut world, 10, at(0, 0), 7);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.body.action_points = 100;
        }
        world.check_monsters(0, 1_000);
        assert_eq!(
            world.monsters.get(CharacterId(10)).map(|m| m.body.action_points),
            Some(90)
        );

        // Wander: no target anywhere.
        let mut world = crate::world::state::test_support::world();
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));
        add_monster(&mut world, 10, at(0, 0), 7);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.body.action_points = 100;
        }
        world.check_monsters(0, 1_000);
        assert_eq!(
            world.monsters.get(CharacterId(10)).map(|m| m.body.action_points),
            Some(70)
        );
    }

    #[test]
    fn dead_monsters_are_reaped_after_the_pass() {
        let mut world = world();
        world.species.insert(RaceId(7), SpeciesDefinition::new("wolf"));
        add_monster(&mut world, 10, at(0, 0), 7);
        add_monster(&mut world, 11, at(5, 5), 7);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.body.take_damage(1_000);
        }

        world.check_monsters(1, 1_000);
        assert!(!world.monsters.contains(CharacterId(10)));
        assert!(world.monsters.contains(CharacterId(11)));
    }

    #[test]
    fn enemy_near_hook_takes_over_the_turn() {
        struct Pacifist {
            fired: AtomicBool,
        }
        impl MonsterHooks for Pacifist {
            fn enemy_near(&self, _monster: CharacterId, _enemy: CharacterId) -> bool {
                self.fired.store(true, Ordering::SeqCst);
                true
            }
        }

        let mut world = world();
        let hooks = Arc::new(Pacifist {
            fired: AtomicBool::new(false),
        });
        world.species.insert(
            RaceId(7),
            SpeciesDefinition::new("watcher").with_hooks(hooks.clone()),
        );
        add_player(&mut world, 1, at(1, 0));
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);

        world.check_monsters(1, 1_000);

        assert!(hooks.fired.load(Ordering::SeqCst));
        assert_eq!(
            world.players.get(CharacterId(1)).map(|p| p.body.hitpoints),
            Some(100)
        );
    }

    #[test]
    fn set_target_hook_can_veto_all_candidates() {
        struct Blind;
        impl MonsterHooks for Blind {
            fn set_target(
                &self,
                _monster: CharacterId,
                _candidates: &[TargetRef],
            ) -> TargetChoice {
                TargetChoice::NoTarget
            }
        }

        let mut world = world();
        world.species.insert(
            RaceId(7),
            SpeciesDefinition::new("blind one").with_hooks(Arc::new(Blind)),
        );
        add_player(&mut world, 1, at(1, 0));
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);

        world.check_monsters(1, 1_000);

        assert_eq!(
            world.players.get(CharacterId(1)).map(|p| p.body.hitpoints),
            Some(100)
        );
        let monster = world.monsters.get(CharacterId(10)).expect("monster");
        assert!(monster.enemy_id.is_none());
    }

    #[test]
    fn routed_monster_reports_both_scans_and_keeps_walking() {
        struct Sentry {
            near: AtomicUsize,
            sighted: AtomicUsize,
        }
        impl MonsterHooks for Sentry {
            fn enemy_near(&self, _monster: CharacterId, _enemy: CharacterId) -> bool {
                self.near.fetch_add(1, Ordering::SeqCst);
                false
            }
            fn enemy_on_sight(&self, _monster: CharacterId, _enemy: CharacterId) -> bool {
                self.sighted.fetch_add(1, Ordering::SeqCst);
                false
            }
        }

        let mut world = world();
        let hooks = Arc::new(Sentry {
            near: AtomicUsize::new(0),
            sighted: AtomicUsize::new(0),
        });
        world.species.insert(
            RaceId(7),
            SpeciesDefinition::new("sentry").with_hooks(hooks.clone()),
        );
        add_player(&mut world, 1, at(0, 1));
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.follow_route(Route::from_waypoints([at(2, 0)]));
        }

        world.check_monsters(1, 1_000);

        // The adjacent player shows up in both scans; the walk continues
        // and the player is not attacked.
        assert_eq!(hooks.near.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.sighted.load(Ordering::SeqCst), 1);
        let monster = world.monsters.get(CharacterId(10)).expect("monster");
        assert!(monster.on_route);
        assert_eq!(monster.body.position, at(1, 0));
        assert_eq!(
            world.players.get(CharacterId(1)).map(|p| p.body.hitpoints),
            Some(100)
        );
    }

    #[test]
    fn failed_swing_falls_through_to_the_view_scan() {
        struct Misdirector {
            calls: AtomicUsize,
        }
        impl MonsterHooks for Misdirector {
            fn set_target(&self, _monster: CharacterId, _candidates: &[TargetRef]) -> TargetChoice {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    // Points at a character that no longer exists.
                    TargetChoice::Target(TargetRef {
                        id: CharacterId(999),
                        kind: CharacterKind::Player,
                        position: at(9, 9),
                    })
                } else {
                    TargetChoice::NotHandled
                }
            }
        }

        let mut world = world();
        let hooks = Arc::new(Misdirector {
            calls: AtomicUsize::new(0),
        });
        world.species.insert(
            RaceId(7),
            SpeciesDefinition::new("confused one").with_hooks(hooks.clone()),
        );
        add_player(&mut world, 1, at(1, 0));
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);

        world.check_monsters(1, 1_000);

        // The near-scan target went stale, so the swing failed and the
        // view scan took over: the monster stepped toward the player
        // instead of ending its turn.
        assert_eq!(hooks.calls.load(Ordering::SeqCst), 2);
        let monster = world.monsters.get(CharacterId(10)).expect("monster");
        assert!(monster.enemy_id.is_none());
        assert_eq!(monster.body.position, at(1, 0));
        assert_eq!(
            world.players.get(CharacterId(1)).map(|p| p.body.hitpoints),
            Some(100)
        );
    }

    #[test]
    fn blocked_route_step_aborts_the_route() {
        struct RouteWatcher {
            aborted: AtomicUsize,
        }
        impl MonsterHooks for RouteWatcher {
            fn abort_route(&self, _monster: CharacterId) {
                self.aborted.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut map = crate::world::map::GridMap::unbounded();
        map.block(at(1, 0));
        let mut world = crate::world::state::WorldState::new(Box::new(map), 0);
        let hooks = Arc::new(RouteWatcher {
            aborted: AtomicUsize::new(0),
        });
        world.species.insert(
            RaceId(7),
            SpeciesDefinition::new("patroller").with_hooks(hooks.clone()),
        );
        add_monster(&mut world, 10, at(0, 0), 7);
        ready(&mut world, 10);
        if let Some(monster) = world.monsters.get_mut(CharacterId(10)) {
            monster.follow_route(Route::from_waypoints([at(3, 0)]));
        }

        world.check_monsters(1, 1_000);

        let monster = world.monsters.get(CharacterId(10)).expect("monster");
        assert!(!monster.on_route);
        assert!(monster.route.is_empty());
        assert_eq!(monster.body.position, at(0, 0));
        assert_eq!(hooks.aborted.load(Ordering::SeqCst), 1);
    }
}
