mod config;
pub mod entities;
pub mod net;
pub mod persistence;
pub mod scripting;
pub mod telemetry;
pub mod world;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use world::scheduler::{standard_tasks, Scheduler};
pub use world::state::{process_immediate_commands, ImmediateCommandQueue, WorldState};

/// Cooperative stop flag shared with whatever embeds the tick loop.
#[derive(Debug, Default)]
pub struct WorldControl {
    shutdown: AtomicBool,
}

impl WorldControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

pub fn run(args: &[String]) -> Result<(), String> {
    let config = config::AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;

    let start_ms = wall_clock_ms();
    let mut state = world::state::WorldState::new(
        Box::new(world::map::GridMap::unbounded()),
        start_ms,
    );
    state.client_timeout_secs = config.client_timeout_secs;
    state.spawn_enabled = config.spawn_enabled;
    let store = persistence::spawns::YamlSpawnStore::from_root(&config.root);
    state.spawns.load(&store);

    println!("ravenmoor: world core");
    println!("- data root: {}", config.root.display());
    println!("- spawn points: {}", state.spawns.points().len());
    println!("- spawning: {}", if state.spawn_enabled { "on" } else { "off" });
    println!("- client timeout: {}s", state.client_timeout_secs);
    telemetry::logging::log_game("world started");

    let world = Arc::new(Mutex::new(state));
    let immediate = Arc::new(ImmediateCommandQueue::new());
    let control = Arc::new(WorldControl::new());
    let scheduler = standard_tasks(start_ms);
    run_tick_loop(&world, &immediate, &control, scheduler)
}

/// The tick thread's body: run due scheduler tasks under the world lock,
/// then drain the immediate command queue, then sleep briefly. Returns
/// when the control flag is set or the world lock is poisoned.
pub fn run_tick_loop(
    world: &Mutex<WorldState>,
    immediate: &ImmediateCommandQueue,
    control: &WorldControl,
    mut scheduler: Scheduler,
) -> Result<(), String> {
    while !control.shutdown_requested() {
        let now_ms = wall_clock_ms();
        {
            let mut world = world.lock().map_err(|_| "world lock poisoned".to_string())?;
            scheduler.run_due(&mut world, now_ms);
        }
        process_immediate_commands(immediate, world);
        std::thread::sleep(Duration::from_millis(10));
    }
    telemetry::logging::log_game("world stopped");
    Ok(())
}
