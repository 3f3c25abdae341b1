pub mod character;
pub mod effects;
pub mod monster;
pub mod npc;
pub mod player;
pub mod route;
