pub mod arb;
pub mod level;
pub mod log;
pub mod plugin;
