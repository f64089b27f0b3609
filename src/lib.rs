pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod simulator;
pub mod spec;

pub use accel_plugin::arb::{ArbCmd, ArbData};
pub use accel_plugin::level::Loglevel;
pub use accel_plugin::log::LogRecord;
pub use accel_plugin::plugin::{HostLink, PluginDefinition, PluginError, PluginMetadata, PluginRole};

pub use config::plugin::{PluginConfig, PluginConfigBuilder, ProcessConfig, StreamCapture};
pub use config::seed::Seed;
pub use config::simulation::{ReproductionPathStyle, SimulationConfig, SimulatorOptions};
pub use engine::{PluginTarget, SimulationEngine, SimulationHandle};
pub use error::{Result, SimulatorError};
pub use logger::{LogBridge, LogSink};
pub use simulator::Simulator;
pub use spec::PluginSpecification;
