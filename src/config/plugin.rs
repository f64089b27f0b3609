use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use accel_plugin::arb::ArbCmd;
use accel_plugin::level::Loglevel;
use accel_plugin::plugin::{PluginDefinition, PluginRole};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulatorError};
use crate::spec::PluginSpecification;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a captured process output stream is handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamCapture {
    /// Leave the stream attached to the host process' own stream.
    Pass,
    /// Log each line of output at the given level. `Off` discards the
    /// stream entirely.
    Level(Loglevel),
}

impl From<Loglevel> for StreamCapture {
    fn from(level: Loglevel) -> Self {
        StreamCapture::Level(level)
    }
}

/// Builder for the per-plugin configuration options. Options apply lazily:
/// nothing is validated until the builder is attached to a pipeline slot,
/// and nothing engine-facing exists until the pipeline is assembled.
#[derive(Debug, Clone)]
pub struct PluginConfigBuilder {
    specification: PluginSpecification,
    name: Option<String>,
    init: Vec<ArbCmd>,
    verbosity: Loglevel,
    tee: BTreeMap<PathBuf, Loglevel>,
    env: BTreeMap<String, Option<String>>,
    work: Option<PathBuf>,
    stderr: Option<StreamCapture>,
    stdout: Option<StreamCapture>,
    accept_timeout: Option<Duration>,
    shutdown_timeout: Option<Duration>,
}

impl PluginConfigBuilder {
    pub fn new(specification: PluginSpecification) -> Self {
        PluginConfigBuilder {
            specification,
            name: None,
            init: Vec::new(),
            verbosity: Loglevel::Trace,
            tee: BTreeMap::new(),
            env: BTreeMap::new(),
            work: None,
            stderr: None,
            stdout: None,
            accept_timeout: None,
            shutdown_timeout: None,
        }
    }

    pub fn managed<D: PluginDefinition + 'static>(definition: D) -> Self {
        Self::new(PluginSpecification::managed(definition))
    }

    pub fn spawn<F: FnMut(&str) + Send + 'static>(callback: F) -> Self {
        Self::new(PluginSpecification::spawn(callback))
    }

    /// Display name, used in log messages and for name-based addressing.
    /// Empty or omitted, the role-based default applies at assembly time.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a command for the plugin's initialization callback.
    /// Commands are delivered in the order they were added.
    pub fn with_init_cmd(mut self, cmd: ArbCmd) -> Self {
        self.init.push(cmd);
        self
    }

    /// Minimum level a message must have to be forwarded to the simulator
    /// process. Defaults to `Trace`, which disables the filter.
    pub fn with_verbosity(mut self, level: Loglevel) -> Self {
        self.verbosity = level;
        self
    }

    /// Additionally logs this plugin's messages passing `level` to `file`.
    pub fn with_tee(mut self, file: impl Into<PathBuf>, level: Loglevel) -> Self {
        self.tee.insert(file.into(), level);
        self
    }

    /// Sets or overrides an environment variable in the plugin process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), Some(value.into()));
        self
    }

    /// Removes a variable from the plugin process environment.
    pub fn without_env(mut self, key: impl Into<String>) -> Self {
        self.env.insert(key.into(), None);
        self
    }

    /// Working directory for the plugin process; the default is the
    /// current working directory.
    pub fn with_work(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work = Some(dir.into());
        self
    }

    pub fn with_stderr(mut self, mode: impl Into<StreamCapture>) -> Self {
        self.stderr = Some(mode.into());
        self
    }

    pub fn with_stdout(mut self, mode: impl Into<StreamCapture>) -> Self {
        self.stdout = Some(mode.into());
        self
    }

    /// How long the engine waits for the plugin process to connect.
    pub fn with_accept_timeout(mut self, timeout: Duration) -> Self {
        self.accept_timeout = Some(timeout);
        self
    }

    /// How long the engine waits for the plugin process to shut down after
    /// the abort request before considering the shutdown abnormal.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// First process-only option that was set, if any. These options are
    /// undefined for managed-thread plugins.
    fn process_option_set(&self) -> Option<&'static str> {
        if !self.env.is_empty() {
            Some("env")
        } else if self.work.is_some() {
            Some("work")
        } else if self.stderr.is_some() {
            Some("stderr")
        } else if self.stdout.is_some() {
            Some("stdout")
        } else if self.accept_timeout.is_some() {
            Some("accept_timeout")
        } else if self.shutdown_timeout.is_some() {
            Some("shutdown_timeout")
        } else {
            None
        }
    }
}

impl From<PluginSpecification> for PluginConfigBuilder {
    fn from(specification: PluginSpecification) -> Self {
        Self::new(specification)
    }
}

impl From<&str> for PluginConfigBuilder {
    fn from(text: &str) -> Self {
        Self::new(text.into())
    }
}

impl From<String> for PluginConfigBuilder {
    fn from(text: String) -> Self {
        Self::new(text.into())
    }
}

impl<P: Into<PathBuf>> From<(P, Option<P>)> for PluginConfigBuilder {
    fn from(paths: (P, Option<P>)) -> Self {
        Self::new(paths.into())
    }
}

/// A validated pipeline slot: an immutable factory for the engine-facing
/// [`PluginConfig`]. Sealing is infallible and repeatable, so the same
/// setup can serve any number of consecutive simulations.
#[derive(Debug, Clone)]
pub struct PluginSetup {
    role: PluginRole,
    builder: PluginConfigBuilder,
}

impl PluginSetup {
    pub(crate) fn new(role: PluginRole, builder: PluginConfigBuilder) -> Result<Self> {
        if let PluginSpecification::Managed(definition) = &builder.specification {
            let actual = definition.lock().unwrap().role();
            if actual != role {
                return Err(SimulatorError::InvalidArgument(format!(
                    "managed plugin definition has role {actual}, expected {role}"
                )));
            }
        }
        if !builder.specification.is_process() {
            if let Some(option) = builder.process_option_set() {
                return Err(SimulatorError::InvalidArgument(format!(
                    "the {option:?} option is only valid for plugin processes"
                )));
            }
        }
        Ok(PluginSetup { role, builder })
    }

    pub fn role(&self) -> PluginRole {
        self.role
    }

    pub(crate) fn seal(&self, default_name: &str) -> PluginConfig {
        let builder = &self.builder;
        let name = match &builder.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => default_name.to_string(),
        };
        let process = builder.specification.is_process().then(|| ProcessConfig {
            env: builder.env.clone(),
            work: builder.work.clone(),
            stderr: builder.stderr.unwrap_or(StreamCapture::Level(Loglevel::Info)),
            stdout: builder.stdout.unwrap_or(StreamCapture::Level(Loglevel::Info)),
            accept_timeout: builder.accept_timeout.unwrap_or(DEFAULT_TIMEOUT),
            shutdown_timeout: builder.shutdown_timeout.unwrap_or(DEFAULT_TIMEOUT),
        });
        PluginConfig {
            role: self.role,
            name,
            specification: builder.specification.clone(),
            init: builder.init.clone(),
            verbosity: builder.verbosity,
            tee: builder.tee.clone(),
            process,
        }
    }
}

/// Engine-facing configuration for one plugin, frozen for the lifetime of
/// a run.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub role: PluginRole,
    pub name: String,
    pub specification: PluginSpecification,
    pub init: Vec<ArbCmd>,
    pub verbosity: Loglevel,
    pub tee: BTreeMap<PathBuf, Loglevel>,
    /// Present exactly when the specification launches an external
    /// process.
    pub process: Option<ProcessConfig>,
}

/// Launch options that only exist for process-backed plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Environment overrides applied on top of the host environment;
    /// `None` removes the variable.
    pub env: BTreeMap<String, Option<String>>,
    /// `None` means the current working directory.
    pub work: Option<PathBuf>,
    pub stderr: StreamCapture,
    pub stdout: StreamCapture,
    pub accept_timeout: Duration,
    pub shutdown_timeout: Duration,
}
