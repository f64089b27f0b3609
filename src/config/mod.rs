pub mod plugin;
pub mod seed;
pub mod simulation;
