pub mod fighting;
pub mod hooks;
