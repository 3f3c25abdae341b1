pub mod spawns;
