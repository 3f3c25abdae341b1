//! Gameplay rate constants shared by the tick phases.

/// One action point accrues per this many wall-clock milliseconds.
pub const AP_GRANULARITY_MS: u64 = 100;

pub const MAX_ACTION_POINTS: i32 = 1000;
pub const MAX_FIGHT_POINTS: i32 = 1000;

/// Minimum action points before a character may act at all.
pub const MIN_AP_FOR_ACTION: i32 = 10;

/// Action point cost of one tile step.
pub const STEP_COST: i32 = 10;

/// Fight point cost of one attack.
pub const ATTACK_FIGHT_COST: i32 = 20;

/// Damage dealt by an unarmed swing.
pub const BASE_ATTACK_STRENGTH: i32 = 10;

/// Extra action point charge when a monster wanders with no target near.
pub const WANDER_AWAY_PENALTY: i32 = 20;

/// Widened targeting radius used when nothing is in weapon range.
pub const MONSTER_VIEW_RANGE: i32 = 9;

/// Melee reach assumed when no equipped weapon has a range entry.
pub const MELEE_RANGE: i32 = 1;

/// Radius inside which players are told about appearances, removals and
/// moves; roughly one client screen.
pub const VIEW_BROADCAST_RANGE: i32 = 14;

/// Graphic effect id shown on a successful hit.
pub const GFX_HIT: u16 = 13;

/// Graphic effect id shown when a monster heals itself.
pub const GFX_SELF_HEAL: u16 = 11;

/// Hitpoints restored per self-heal.
pub const SELF_HEAL_AMOUNT: i32 = 10;

/// Cadence of the spawn repopulation check.
pub const SPAWN_CHECK_SECONDS: u64 = 10;

/// Keepalive threshold before a player is force-disconnected.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: i64 = 30;

/// Length of one in-game day in real seconds.
pub const GAME_DAY_SECONDS: i64 = 28_800;

/// Unix timestamp of the first in-game day boundary.
pub const GAME_CALENDAR_EPOCH: i64 = 1_051_740_000;
