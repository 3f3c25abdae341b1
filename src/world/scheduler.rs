//! Recurring task scheduler driven by the tick thread. Tasks run under
//! the world lock; a slow task delays the turn rather than overlapping it.

use chrono::{Datelike, Local, Offset, TimeZone};

use crate::net::connection::ServerEffect;
use crate::telemetry::logging;
use crate::world::state::WorldState;
use crate::world::tuning::{GAME_CALENDAR_EPOCH, GAME_DAY_SECONDS};

type TaskAction = Box<dyn FnMut(&mut WorldState, u64) + Send>;

struct ScheduledTask {
    name: &'static str,
    interval_ms: u64,
    next_due_ms: u64,
    action: TaskAction,
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recurring task first due one interval from `now_ms`.
    pub fn add_recurring(
        &mut self,
        name: &'static str,
        interval_ms: u64,
        now_ms: u64,
        action: impl FnMut(&mut WorldState, u64) + Send + 'static,
    ) {
        self.add_recurring_from(name, interval_ms, now_ms + interval_ms.max(1), action);
    }

    /// Recurring task with an explicit first due time, for tasks aligned
    /// to an external boundary (the in-game day).
    pub fn add_recurring_from(
        &mut self,
        name: &'static str,
        interval_ms: u64,
        first_due_ms: u64,
        action: impl FnMut(&mut WorldState, u64) + Send + 'static,
    ) {
        self.tasks.push(ScheduledTask {
            name,
            interval_ms: interval_ms.max(1),
            next_due_ms: first_due_ms,
            action: Box::new(action),
        });
    }

    /// Run every task whose due time has passed. A task fires at most
    /// once per call; missed intervals are skipped, not replayed.
    pub fn run_due(&mut self, world: &mut WorldState, now_ms: u64) -> usize {
        let mut fired = 0;
        for task in &mut self.tasks {
            if now_ms < task.next_due_ms {
                continue;
            }
            (task.action)(world, now_ms);
            let intervals = (now_ms - task.next_due_ms) / task.interval_ms + 1;
            task.next_due_ms += intervals * task.interval_ms;
            fired += 1;
        }
        fired
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|task| task.name).collect()
    }
}

/// The in-game day index for a wall-clock instant. Daylight saving shifts
/// the calendar by its offset so the boundary stays at the same local
/// hour.
pub fn game_day(now_unix: i64, dst_offset_secs: i64) -> i64 {
    (now_unix + dst_offset_secs - GAME_CALENDAR_EPOCH).div_euclid(GAME_DAY_SECONDS)
}

/// Unix time of the next in-game day boundary strictly after `now_unix`.
pub fn next_game_day_boundary(now_unix: i64, dst_offset_secs: i64) -> i64 {
    let local = now_unix + dst_offset_secs - GAME_CALENDAR_EPOCH;
    now_unix + (GAME_DAY_SECONDS - local.rem_euclid(GAME_DAY_SECONDS))
}

/// Current daylight-saving offset of the host timezone: the difference
/// between the offset in force now and the year's standard (winter)
/// offset.
pub fn dst_offset_secs() -> i64 {
    let now = Local::now();
    let year = now.year();
    let probe = |month: u32| {
        Local
            .with_ymd_and_hms(year, month, 15, 12, 0, 0)
            .single()
            .map(|at| i64::from(at.offset().fix().local_minus_utc()))
    };
    let current = i64::from(now.offset().fix().local_minus_utc());
    match (probe(1), probe(7)) {
        (Some(january), Some(july)) => current - january.min(july),
        _ => 0,
    }
}

/// The standard task set: the world turn, learn-point decay, a
/// monitoring heartbeat and the in-game day announcement.
pub fn standard_tasks(now_ms: u64) -> Scheduler {
    let mut scheduler = Scheduler::new();

    scheduler.add_recurring("turn the world", 100, now_ms, |world, now_ms| {
        world.turn_the_world(now_ms);
    });

    scheduler.add_recurring("mental capacity decay", 10_000, now_ms, |world, _| {
        world
            .players
            .for_each_mut(|player| player.body.reduce_mental_capacity());
        world
            .monsters
            .for_each_mut(|monster| monster.body.reduce_mental_capacity());
        world
            .npcs
            .for_each_mut(|npc| npc.body.reduce_mental_capacity());
    });

    let mut last_counts = (usize::MAX, usize::MAX, usize::MAX);
    scheduler.add_recurring("monitoring", 250, now_ms, move |world, _| {
        let counts = (world.players.len(), world.monsters.len(), world.npcs.len());
        if counts != last_counts {
            last_counts = counts;
            logging::log_world(&format!(
                "population: {} players, {} monsters, {} npcs",
                counts.0, counts.1, counts.2
            ));
        }
    });

    let now_unix = (now_ms / 1_000) as i64;
    let first_boundary_ms = next_game_day_boundary(now_unix, dst_offset_secs()) as u64 * 1_000;
    scheduler.add_recurring_from(
        "game day announcement",
        GAME_DAY_SECONDS as u64 * 1_000,
        first_boundary_ms,
        |world, now_ms| {
            let day = game_day((now_ms / 1_000) as i64, dst_offset_secs());
            logging::log_world(&format!("a new in-game day begins: day {day}"));
            world
                .players
                .for_each(|player| player.connection.send(ServerEffect::GameDay { day }));
        },
    );

    scheduler
}
