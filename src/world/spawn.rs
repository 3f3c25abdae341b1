use crate::entities::character::{CharacterBody, CharacterId};
use crate::entities::monster::{Monster, RaceId};
use crate::persistence::spawns::{SpawnLoadError, SpawnPointRow, SpawnStore};
use crate::telemetry::logging;
use crate::world::position::Position;
use crate::world::species::SpeciesTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpawnPointId(pub u32);

/// Allocates world-unique character ids.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn allocate(&mut self) -> CharacterId {
        let id = CharacterId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug)]
pub struct SpawnEntry {
    pub race: RaceId,
    pub max_count: u16,
    /// Ids of monsters this entry currently owns. Weak references: the
    /// registry owns the monsters, death bookkeeping removes ids here.
    pub monsters: Vec<CharacterId>,
}

/// A territory definition monsters are created from and wander within
/// (L-infinity boundary of `radius` around `center`).
#[derive(Debug)]
pub struct SpawnPoint {
    pub id: SpawnPointId,
    pub center: Position,
    pub radius: i32,
    pub spawn_radius: i32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub spawn_all: bool,
    pub entries: Vec<SpawnEntry>,
    next_due_ms: u64,
}

impl SpawnPoint {
    pub fn from_row(row: &SpawnPointRow) -> Self {
        Self {
            id: SpawnPointId(row.id),
            center: Position {
                x: row.x,
                y: row.y,
                z: row.z,
            },
            radius: row.radius.max(0),
            spawn_radius: row.spawn_radius.max(0).min(row.radius.max(0)),
            min_delay_ms: row.min_delay_secs.min(row.max_delay_secs) * 1000,
            max_delay_ms: row.max_delay_secs.max(row.min_delay_secs) * 1000,
            spawn_all: row.spawn_all,
            entries: row
                .entries
                .iter()
                .map(|entry| SpawnEntry {
                    race: RaceId(entry.race),
                    max_count: entry.count,
                    monsters: Vec::new(),
                })
                .collect(),
            next_due_ms: 0,
        }
    }

    pub fn owned_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.monsters.len()).sum()
    }

    fn note_death(&mut self, monster: CharacterId) {
        for entry in &mut self.entries {
            entry.monsters.retain(|id| *id != monster);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SpawnRng {
    state: u64,
}

impl SpawnRng {
    fn from_seed(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn roll_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        let span = (max - min + 1) as u64;
        let value = ((self.state >> 32) as u64) % span;
        min + value as i64
    }
}

/// Owns the spawn-point list, repopulates monster populations on a coarse
/// timer, and buffers new monsters until the monster phase's commit point.
pub struct SpawnManager {
    points: Vec<SpawnPoint>,
    pending: Vec<Monster>,
    rng: SpawnRng,
}

impl Default for SpawnManager {
    fn default() -> Self {
        Self::new(0x9e3779b97f4a7c15)
    }
}

impl SpawnManager {
    pub fn new(seed: u64) -> Self {
        Self {
            points: Vec::new(),
            pending: Vec::new(),
            rng: SpawnRng::from_seed(seed),
        }
    }

    /// Replace the spawn list wholesale from the persisted table. Soft
    /// failure (no rows) leaves the list empty and returns false; an
    /// access fault is logged and also returns false.
    pub fn load(&mut self, store: &dyn SpawnStore) -> bool {
        self.points.clear();
        self.pending.clear();
        match store.load_spawn_points() {
            Ok(rows) => {
                self.points = rows.iter().map(SpawnPoint::from_row).collect();
                logging::log_world(&format!("loaded {} spawn points", self.points.len()));
                true
            }
            Err(SpawnLoadError::NoData) => {
                logging::log_world("no spawn points persisted, world starts empty");
                false
            }
            Err(SpawnLoadError::Access(message)) => {
                logging::log_error(&format!("spawn point load failed: {}", message));
                eprintln!("ravenmoor: spawn point load failed: {}", message);
                false
            }
        }
    }

    pub fn points(&self) -> &[SpawnPoint] {
        &self.points
    }

    pub fn point(&self, id: SpawnPointId) -> Option<&SpawnPoint> {
        self.points.iter().find(|point| point.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Repopulate due spawn points up to their per-race caps. New
    /// monsters are buffered here and only committed into the registry by
    /// `take_pending` at the monster phase's join point.
    pub fn tick(&mut self, now_ms: u64, ids: &mut IdAllocator, species: &SpeciesTable) {
        for point in &mut self.points {
            if now_ms < point.next_due_ms {
                continue;
            }
            point.next_due_ms = now_ms
                + self
                    .rng
                    .roll_range_i64(point.min_delay_ms as i64, point.max_delay_ms as i64)
                    as u64;

            for entry_index in 0..point.entries.len() {
                let deficit = {
                    let entry = &point.entries[entry_index];
                    usize::from(entry.max_count).saturating_sub(entry.monsters.len())
                };
                if deficit == 0 {
                    continue;
                }
                let batch = if point.spawn_all { deficit } else { 1 };
                for _ in 0..batch {
                    let dx = self
                        .rng
                        .roll_range_i64(-i64::from(point.spawn_radius), i64::from(point.spawn_radius));
                    let dy = self
                        .rng
                        .roll_range_i64(-i64::from(point.spawn_radius), i64::from(point.spawn_radius));
                    let position = Position {
                        x: point.center.x + dx as i32,
                        y: point.center.y + dy as i32,
                        z: point.center.z,
                    };
                    let race = point.entries[entry_index].race;
                    let id = ids.allocate();
                    let body = match species.get(race) {
                        Some(definition) => {
                            let mut body = CharacterBody::new(id, definition.name.clone(), position);
                            body.max_hitpoints = definition.max_hitpoints;
                            body.hitpoints = definition.max_hitpoints;
                            body
                        }
                        None => {
                            logging::log_error(&format!(
                                "no species definition for race {} at spawn {}",
                                race.0, point.id.0
                            ));
                            CharacterBody::new(id, format!("race {}", race.0), position)
                        }
                    };
                    let mut monster = Monster::new(body, race, Some(point.id));
                    if let Some(definition) = species.get(race) {
                        monster.attack_strength = definition.attack_strength;
                    }
                    point.entries[entry_index].monsters.push(id);
                    self.pending.push(monster);
                }
            }
        }
    }

    /// Drain the buffered monsters for commit into the registry.
    pub fn take_pending(&mut self) -> Vec<Monster> {
        std::mem::take(&mut self.pending)
    }

    /// Death bookkeeping: drop the weak back-reference so the slot can be
    /// refilled on the next due check.
    pub fn note_death(&mut self, spawn: SpawnPointId, monster: CharacterId) {
        if let Some(point) = self.points.iter_mut().find(|point| point.id == spawn) {
            point.note_death(monster);
        }
    }
}
