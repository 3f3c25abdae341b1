//! NPC phase of the world turn. NPCs are never removed: a dead NPC is
//! restored to full health on the spot, with a spin shown to nearby
//! players so the revival is visible.

use crate::entities::character::CharacterId;
use crate::entities::effects::EffectKind;
use crate::telemetry::logging;
use crate::world::position::Direction;
use crate::world::state::WorldState;

impl WorldState {
    pub(crate) fn check_npcs(&mut self, ap: i32, now_ms: u64) {
        for id in self.npcs.ids() {
            let revived_at = match self.npcs.get_mut(id) {
                Some(npc) if !npc.body.alive => {
                    npc.body.restore_to_full();
                    Some(npc.body.position)
                }
                Some(npc) => {
                    npc.body.increase_action_points(ap);
                    npc.body.increase_fight_points(ap);
                    npc.body.effects.advance(now_ms);
                    if npc.body.effects.is_active(EffectKind::Regenerating) {
                        npc.body.heal(1);
                    }
                    None
                }
                None => continue,
            };
            if let Some(position) = revived_at {
                logging::log_game(&format!("npc {} revived in place", id.0));
                self.broadcast_spin(id, position);
                continue;
            }

            let (script, on_route, finished, can_act) = match self.npcs.get(id) {
                Some(npc) => (
                    npc.script.clone(),
                    npc.on_route,
                    npc.route.is_empty(),
                    npc.body.can_act(),
                ),
                None => continue,
            };
            if !can_act {
                continue;
            }
            if let Some(script) = &script {
                script.next_cycle(id);
            }
            if on_route && finished {
                // Walked the route out; no abort.
                if let Some(npc) = self.npcs.get_mut(id) {
                    npc.on_route = false;
                }
            } else if on_route && !self.advance_npc_route(id) {
                if let Some(npc) = self.npcs.get_mut(id) {
                    npc.on_route = false;
                    npc.route.clear();
                }
                if let Some(script) = &script {
                    script.abort_route(id);
                }
            }
        }
    }

    fn advance_npc_route(&mut self, id: CharacterId) -> bool {
        let (from, goal) = match self.npcs.get(id) {
            Some(npc) => match npc.route.next_waypoint() {
                Some(goal) => (npc.body.position, goal),
                None => return false,
            },
            None => return false,
        };
        let Some(direction) = Direction::toward(from, goal) else {
            if let Some(npc) = self.npcs.get_mut(id) {
                npc.route.arrive_at(from);
            }
            return true;
        };
        if !self.move_npc(id, direction) {
            return false;
        }
        if let Some(npc) = self.npcs.get_mut(id) {
            let position = npc.body.position;
            npc.route.arrive_at(position);
        }
        true
    }
}
