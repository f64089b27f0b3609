use std::collections::BTreeMap;
use std::path::PathBuf;

use accel_plugin::level::Loglevel;
use accel_plugin::log::LogRecord;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::plugin::PluginConfig;
use crate::config::seed::Seed;
use crate::logger::{LogBridge, LogSink};

/// Path styles for recording filesystem references in a reproduction
/// file.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReproductionPathStyle {
    Keep,
    Absolute,
    Relative,
}

/// Simulator-level options. Accepted once, up front; the simulator
/// freezes them into a [`SimulationConfig`] at launch time.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    pub(crate) repro: Option<ReproductionPathStyle>,
    pub(crate) engine_verbosity: Loglevel,
    pub(crate) stderr_verbosity: Loglevel,
    pub(crate) log_sink: Option<LogSink>,
    pub(crate) log_sink_verbosity: Loglevel,
    pub(crate) tee: BTreeMap<PathBuf, Loglevel>,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        SimulatorOptions {
            repro: Some(ReproductionPathStyle::Keep),
            engine_verbosity: Loglevel::Trace,
            stderr_verbosity: Loglevel::Info,
            log_sink: None,
            log_sink_verbosity: Loglevel::Trace,
            tee: BTreeMap::new(),
        }
    }
}

impl SimulatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path style used when recording a reproduction file.
    pub fn with_repro_style(mut self, style: ReproductionPathStyle) -> Self {
        self.repro = Some(style);
        self
    }

    /// Disables reproduction logging entirely.
    pub fn without_repro(mut self) -> Self {
        self.repro = None;
        self
    }

    /// Minimum level for messages generated by the engine itself.
    pub fn with_engine_verbosity(mut self, level: Loglevel) -> Self {
        self.engine_verbosity = level;
        self
    }

    /// Minimum level for messages logged to stderr.
    pub fn with_stderr_verbosity(mut self, level: Loglevel) -> Self {
        self.stderr_verbosity = level;
        self
    }

    /// Routes log records passing the sink filter to a user callback.
    pub fn with_log_callback(
        mut self,
        callback: impl FnMut(LogRecord) + Send + 'static,
    ) -> Self {
        self.log_sink = Some(LogSink::callback(callback));
        self
    }

    /// Routes log records passing the sink filter onto the `tracing`
    /// facade.
    pub fn with_log_tracing(mut self) -> Self {
        self.log_sink = Some(LogSink::Tracing);
        self
    }

    /// Minimum level for records sent to the configured log sink.
    /// Defaults to `Trace`, which disables the filter.
    pub fn with_log_verbosity(mut self, level: Loglevel) -> Self {
        self.log_sink_verbosity = level;
        self
    }

    /// Additionally logs messages passing `level` to `file`.
    pub fn with_tee(mut self, file: impl Into<PathBuf>, level: Loglevel) -> Self {
        self.tee.insert(file.into(), level);
        self
    }

    pub(crate) fn freeze(&self, seed: Seed, plugins: Vec<PluginConfig>) -> SimulationConfig {
        SimulationConfig {
            seed: seed.value(),
            repro: self.repro,
            engine_verbosity: self.engine_verbosity,
            stderr_verbosity: self.stderr_verbosity,
            log: self
                .log_sink
                .clone()
                .map(|sink| LogBridge::new(sink, self.log_sink_verbosity)),
            tee: self.tee.clone(),
            plugins,
        }
    }
}

/// The root, engine-facing configuration for one simulation run. Frozen at
/// launch time; never mutated afterwards.
#[derive(Debug)]
pub struct SimulationConfig {
    /// `None` leaves seeding to the engine.
    pub seed: Option<u64>,
    /// `None` disables reproduction logging.
    pub repro: Option<ReproductionPathStyle>,
    pub engine_verbosity: Loglevel,
    pub stderr_verbosity: Loglevel,
    /// Bridge toward the host's log sink, if one was configured.
    pub log: Option<LogBridge>,
    pub tee: BTreeMap<PathBuf, Loglevel>,
    /// Frontend, operators in front-to-back order, backend.
    pub plugins: Vec<PluginConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_taxonomy() {
        let options = SimulatorOptions::default();
        assert_eq!(options.repro, Some(ReproductionPathStyle::Keep));
        assert_eq!(options.engine_verbosity, Loglevel::Trace);
        assert_eq!(options.stderr_verbosity, Loglevel::Info);
        assert!(options.log_sink.is_none());
        assert_eq!(options.log_sink_verbosity, Loglevel::Trace);
        assert!(options.tee.is_empty());
    }

    #[test]
    fn repro_styles_parse_from_keywords() {
        assert_eq!(
            "keep".parse::<ReproductionPathStyle>().unwrap(),
            ReproductionPathStyle::Keep
        );
        assert_eq!(
            "absolute".parse::<ReproductionPathStyle>().unwrap(),
            ReproductionPathStyle::Absolute
        );
        assert_eq!(
            "relative".parse::<ReproductionPathStyle>().unwrap(),
            ReproductionPathStyle::Relative
        );
        assert!("disabled".parse::<ReproductionPathStyle>().is_err());
    }

    #[test]
    fn freeze_carries_every_option_over() {
        let options = SimulatorOptions::new()
            .with_repro_style(ReproductionPathStyle::Relative)
            .with_engine_verbosity(Loglevel::Debug)
            .with_stderr_verbosity(Loglevel::Warn)
            .with_log_tracing()
            .with_log_verbosity(Loglevel::Note)
            .with_tee("sim.log", Loglevel::Trace);

        let config = options.freeze(Seed::from(3u64), Vec::new());
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.repro, Some(ReproductionPathStyle::Relative));
        assert_eq!(config.engine_verbosity, Loglevel::Debug);
        assert_eq!(config.stderr_verbosity, Loglevel::Warn);
        assert_eq!(config.log.as_ref().unwrap().verbosity(), Loglevel::Note);
        assert_eq!(
            config.tee.get(&PathBuf::from("sim.log")),
            Some(&Loglevel::Trace)
        );
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn disabling_repro_sticks() {
        let options = SimulatorOptions::new().without_repro();
        assert_eq!(options.freeze(Seed::unset(), Vec::new()).repro, None);
    }
}
