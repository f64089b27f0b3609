use std::fmt;
use std::path::Path;

use accel_plugin::arb::{ArbCmd, ArbData};
use accel_plugin::plugin::{PluginMetadata, PluginRole};
use tracing::{debug, info};

use crate::config::plugin::{PluginConfigBuilder, PluginSetup};
use crate::config::seed::Seed;
use crate::config::simulation::{SimulationConfig, SimulatorOptions};
use crate::engine::{PluginTarget, SimulationEngine, SimulationHandle};
use crate::error::{Result, SimulatorError};

/// Default backend spec when none was configured.
const DEFAULT_BACKEND: &str = "qx";

enum Lifecycle {
    Idle,
    Running(Box<dyn SimulationHandle>),
}

/// Orchestrates a multi-plugin simulation pipeline.
///
/// Configure the pipeline with [`with_frontend`], [`with_operator`], and
/// [`with_backend`], then drive it with [`simulate`] and [`stop`] as many
/// times as desired. Between those two calls the caller acts as the host
/// process and can use [`start`], [`wait`], [`send`], [`recv`],
/// [`yield_now`], and [`arb`] to communicate with the simulated
/// accelerator formed by the plugins. For simple runs, [`run`] combines
/// launch, start, wait, and stop.
///
/// The simulator is not internally synchronized: every protocol operation
/// takes `&mut self`, so access is serialized by construction.
///
/// [`with_frontend`]: Simulator::with_frontend
/// [`with_operator`]: Simulator::with_operator
/// [`with_backend`]: Simulator::with_backend
/// [`simulate`]: Simulator::simulate
/// [`stop`]: Simulator::stop
/// [`start`]: Simulator::start
/// [`wait`]: Simulator::wait
/// [`send`]: Simulator::send
/// [`recv`]: Simulator::recv
/// [`yield_now`]: Simulator::yield_now
/// [`arb`]: Simulator::arb
/// [`run`]: Simulator::run
pub struct Simulator {
    engine: Box<dyn SimulationEngine>,
    options: SimulatorOptions,
    front: Option<PluginSetup>,
    opers: Vec<PluginSetup>,
    back: Option<PluginSetup>,
    lifecycle: Lifecycle,
}

impl Simulator {
    pub fn new(engine: impl SimulationEngine + 'static) -> Self {
        Self::with_options(engine, SimulatorOptions::default())
    }

    pub fn with_options(engine: impl SimulationEngine + 'static, options: SimulatorOptions) -> Self {
        Simulator {
            engine: Box::new(engine),
            options,
            front: None,
            opers: Vec::new(),
            back: None,
            lifecycle: Lifecycle::Idle,
        }
    }

    // -------------------------------------------------------------------
    // Pipeline configuration (legal while idle only)
    // -------------------------------------------------------------------

    /// Sets the frontend plugin. Repeated calls overwrite; the last one
    /// counts.
    pub fn with_frontend(&mut self, plugin: impl Into<PluginConfigBuilder>) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.front = Some(PluginSetup::new(PluginRole::Frontend, plugin.into())?);
        Ok(self)
    }

    /// Adds an operator plugin. Operators accumulate in front-to-back
    /// call order.
    pub fn with_operator(&mut self, plugin: impl Into<PluginConfigBuilder>) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.opers
            .push(PluginSetup::new(PluginRole::Operator, plugin.into())?);
        Ok(self)
    }

    /// Sets the backend plugin. Repeated calls overwrite; left unset, the
    /// simulation defaults to the `"qx"` backend at launch time.
    pub fn with_backend(&mut self, plugin: impl Into<PluginConfigBuilder>) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.back = Some(PluginSetup::new(PluginRole::Backend, plugin.into())?);
        Ok(self)
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Launches the configured pipeline, leaving seeding to the engine.
    pub fn simulate(&mut self) -> Result<()> {
        self.simulate_seeded(Seed::unset())
    }

    /// Launches the configured pipeline with an explicit random seed.
    pub fn simulate_seeded(&mut self, seed: impl Into<Seed>) -> Result<()> {
        if self.is_running() {
            return Err(SimulatorError::IllegalState(
                "Cannot run multiple simulations at once".into(),
            ));
        }
        if self.front.is_none() {
            return Err(SimulatorError::IllegalState(
                "Frontend plugin was never specified".into(),
            ));
        }
        if self.back.is_none() {
            self.back = Some(PluginSetup::new(
                PluginRole::Backend,
                PluginConfigBuilder::from(DEFAULT_BACKEND),
            )?);
        }

        let config = self.assemble(seed.into());
        let plugins = config.plugins.len();
        let handle = self.engine.launch(config)?;
        self.lifecycle = Lifecycle::Running(handle);
        info!(plugins, "simulation launched");
        Ok(())
    }

    /// Seals the pipeline into the engine-facing configuration, applying
    /// role-based default names in front-to-back order.
    fn assemble(&self, seed: Seed) -> SimulationConfig {
        let mut plugins = Vec::with_capacity(self.pipeline_len());
        if let Some(front) = &self.front {
            plugins.push(front.seal("front"));
        }
        for (index, oper) in self.opers.iter().enumerate() {
            plugins.push(oper.seal(&format!("op{}", index + 1)));
        }
        if let Some(back) = &self.back {
            plugins.push(back.seal("back"));
        }
        self.options.freeze(seed, plugins)
    }

    /// Stops a simulation previously started through [`simulate`].
    ///
    /// [`simulate`]: Simulator::simulate
    pub fn stop(&mut self) -> Result<()> {
        self.halt(None)
    }

    /// Like [`stop`], but writes a reproduction file to `repro_out` as the
    /// last action before the simulation is released.
    ///
    /// [`stop`]: Simulator::stop
    pub fn stop_with_reproduction(&mut self, repro_out: impl AsRef<Path>) -> Result<()> {
        self.halt(Some(repro_out.as_ref()))
    }

    fn halt(&mut self, repro_out: Option<&Path>) -> Result<()> {
        let Lifecycle::Running(handle) = &mut self.lifecycle else {
            return Err(not_running());
        };
        if let Some(path) = repro_out {
            handle.write_reproduction_file(path)?;
        }
        // Dropping the handle is the single release point.
        self.lifecycle = Lifecycle::Idle;
        info!("simulation stopped");
        Ok(())
    }

    /// Runs a simple simulation without further host interaction: from
    /// idle, launch + start + wait + stop, returning the wait result. On
    /// an already-running simulation only start + wait are performed, so
    /// repeated calls drive repeated accelerator invocations.
    pub fn run(&mut self, args: impl Into<ArbData>) -> Result<ArbData> {
        if self.is_running() {
            self.start(args)?;
            self.wait()
        } else {
            self.simulate()?;
            self.start(args)?;
            let result = self.wait()?;
            self.stop()?;
            Ok(result)
        }
    }

    // -------------------------------------------------------------------
    // Host-accelerator protocol (legal while running only)
    // -------------------------------------------------------------------

    /// Enqueues a run request for the accelerator, carrying `args` to the
    /// frontend's run callback. Takes effect once the host yields.
    pub fn start(&mut self, args: impl Into<ArbData>) -> Result<()> {
        let args = args.into();
        let handle = self.handle_mut()?;
        debug!("queueing start request");
        handle.start(args)
    }

    /// Blocks until the accelerator's run callback completes and returns
    /// its result, or fails with a deadlock error if no forward progress
    /// is possible.
    pub fn wait(&mut self) -> Result<ArbData> {
        self.handle_mut()?.wait()
    }

    /// Queues data for the accelerator; the frontend retrieves it through
    /// its host link.
    pub fn send(&mut self, data: impl Into<ArbData>) -> Result<()> {
        let data = data.into();
        self.handle_mut()?.send(data)
    }

    /// Blocks until the accelerator sends data to the host, with the same
    /// deadlock contract as [`wait`](Simulator::wait).
    pub fn recv(&mut self) -> Result<ArbData> {
        self.handle_mut()?.recv()
    }

    /// Flushes queued requests and blocks until the accelerator blocks
    /// again. Useful to synchronize pending log delivery.
    pub fn yield_now(&mut self) -> Result<()> {
        self.handle_mut()?.yield_now()
    }

    /// Sends an out-of-band command to the addressed pipeline member and
    /// returns its response.
    pub fn arb(&mut self, target: impl Into<PluginTarget>, cmd: ArbCmd) -> Result<ArbData> {
        let target = target.into();
        self.handle_mut()?.arb(&target, cmd)
    }

    /// Implementation name, author, and version of the addressed plugin.
    /// Only meaningful while running, since plugins report their metadata
    /// during initialization.
    pub fn get_meta(&self, target: impl Into<PluginTarget>) -> Result<PluginMetadata> {
        let target = target.into();
        self.handle()?.metadata(&target)
    }

    /// Writes a reproduction file for the running simulation to `path`.
    pub fn write_reproduction_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.handle_mut()?.write_reproduction_file(path.as_ref())
    }

    // -------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------

    /// Number of plugins in the configured pipeline.
    pub fn pipeline_len(&self) -> usize {
        self.opers.len() + usize::from(self.front.is_some()) + usize::from(self.back.is_some())
    }

    pub fn is_running(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Running(_))
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_running() {
            Err(SimulatorError::IllegalState(
                "Cannot reconfigure simulation while it is running".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn handle(&self) -> Result<&dyn SimulationHandle> {
        match &self.lifecycle {
            Lifecycle::Running(handle) => Ok(handle.as_ref()),
            Lifecycle::Idle => Err(not_running()),
        }
    }

    fn handle_mut(&mut self) -> Result<&mut dyn SimulationHandle> {
        match &mut self.lifecycle {
            Lifecycle::Running(handle) => Ok(handle.as_mut()),
            Lifecycle::Idle => Err(not_running()),
        }
    }
}

fn not_running() -> SimulatorError {
    SimulatorError::IllegalState("No simulation is currently running".into())
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("pipeline_len", &self.pipeline_len())
            .field("running", &self.is_running())
            .finish()
    }
}
