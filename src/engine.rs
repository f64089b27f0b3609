use std::path::Path;

use accel_plugin::arb::{ArbCmd, ArbData};
use accel_plugin::plugin::PluginMetadata;
use serde::{Deserialize, Serialize};

use crate::config::simulation::SimulationConfig;
use crate::error::{Result, SimulatorError};

/// Addresses one member of the running pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginTarget {
    /// Zero-based front-to-back index. Negative indices count from the
    /// back, so -1 is the backend and -2 the last operator.
    Index(isize),
    /// Plugin display name.
    Name(String),
}

impl From<isize> for PluginTarget {
    fn from(index: isize) -> Self {
        PluginTarget::Index(index)
    }
}

impl From<i32> for PluginTarget {
    fn from(index: i32) -> Self {
        PluginTarget::Index(index as isize)
    }
}

impl From<&str> for PluginTarget {
    fn from(name: &str) -> Self {
        PluginTarget::Name(name.to_string())
    }
}

impl From<String> for PluginTarget {
    fn from(name: String) -> Self {
        PluginTarget::Name(name)
    }
}

impl PluginTarget {
    /// Resolves to an absolute pipeline index, given the plugin display
    /// names in front-to-back order. Unresolvable targets are invalid
    /// arguments, never panics.
    pub fn resolve(&self, names: &[impl AsRef<str>]) -> Result<usize> {
        match self {
            PluginTarget::Index(index) => {
                let len = names.len() as isize;
                let absolute = if *index < 0 { len + index } else { *index };
                if absolute < 0 || absolute >= len {
                    Err(SimulatorError::InvalidArgument(format!(
                        "plugin index {index} out of range for a pipeline of {len} plugins"
                    )))
                } else {
                    Ok(absolute as usize)
                }
            }
            PluginTarget::Name(name) => names
                .iter()
                .position(|candidate| candidate.as_ref() == name)
                .ok_or_else(|| {
                    SimulatorError::InvalidArgument(format!(
                        "no plugin named {name:?} in the pipeline"
                    ))
                }),
        }
    }
}

/// The simulation engine at its interface boundary. Everything behind
/// `launch` — process spawning, the wire protocol, state computation — is
/// the engine's business.
pub trait SimulationEngine {
    /// Launches the configured pipeline and hands back the running
    /// simulation. The configuration is consumed; it is frozen for the
    /// lifetime of the run.
    fn launch(&self, config: SimulationConfig) -> Result<Box<dyn SimulationHandle>>;
}

/// One running simulation. The lifecycle controller owns the handle
/// exclusively; dropping it releases the simulation, exactly once.
///
/// All operations block the calling thread until the engine produces a
/// result or signals a terminal condition; none are re-entrant.
pub trait SimulationHandle {
    /// Enqueues a run request for the accelerator. Non-blocking; the
    /// request takes effect once the host yields control.
    fn start(&mut self, args: ArbData) -> Result<()>;

    /// Blocks until the accelerator's run callback completes and returns
    /// its result. Fails with a deadlock error instead of blocking
    /// forever when no forward progress is possible.
    fn wait(&mut self) -> Result<ArbData>;

    /// Queues data for the accelerator to receive.
    fn send(&mut self, data: ArbData) -> Result<()>;

    /// Blocks until the accelerator sends data to the host, with the same
    /// deadlock contract as [`wait`](SimulationHandle::wait).
    fn recv(&mut self) -> Result<ArbData>;

    /// Flushes queued requests and blocks until the accelerator blocks
    /// again. Synchronizes pending log delivery.
    fn yield_now(&mut self) -> Result<()>;

    /// Routes an out-of-band command to the addressed plugin and blocks
    /// for the full round trip.
    fn arb(&mut self, target: &PluginTarget, cmd: ArbCmd) -> Result<ArbData>;

    /// Metadata reported by the addressed plugin during its
    /// initialization handshake.
    fn metadata(&self, target: &PluginTarget) -> Result<PluginMetadata>;

    /// Writes a reproduction file for the current run to `path`.
    fn write_reproduction_file(&mut self, path: &Path) -> Result<()>;
}
