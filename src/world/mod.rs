pub mod items;
pub mod map;
mod monster_ai;
mod npc_ai;
pub mod position;
pub mod registry;
pub mod scheduler;
pub mod spawn;
pub mod species;
pub mod state;
pub mod talk;
pub mod tick;
pub mod tuning;
