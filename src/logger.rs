use std::fmt;
use std::sync::{Arc, Mutex};

use accel_plugin::level::Loglevel;
use accel_plugin::log::LogRecord;
use tracing::{debug, error, info, trace, warn};

/// Callback type for user log sinks.
pub type LogCallback = dyn FnMut(LogRecord) + Send;

/// Destination for simulation log records.
#[derive(Clone)]
pub enum LogSink {
    /// A user callback. The callback is shared, so a simulator can hand it
    /// to any number of consecutive simulations.
    Callback(Arc<Mutex<LogCallback>>),
    /// Forward records onto the `tracing` facade.
    Tracing,
}

impl LogSink {
    pub fn callback(callback: impl FnMut(LogRecord) + Send + 'static) -> Self {
        LogSink::Callback(Arc::new(Mutex::new(callback)))
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Callback(_) => f.write_str("Callback(..)"),
            LogSink::Tracing => f.write_str("Tracing"),
        }
    }
}

/// Adapts engine-emitted log records into the configured sink. Records are
/// delivered in emission order; those below the configured level are
/// dropped.
#[derive(Debug, Clone)]
pub struct LogBridge {
    sink: LogSink,
    verbosity: Loglevel,
}

impl LogBridge {
    pub fn new(sink: LogSink, verbosity: Loglevel) -> Self {
        LogBridge { sink, verbosity }
    }

    pub fn verbosity(&self) -> Loglevel {
        self.verbosity
    }

    pub fn deliver(&mut self, record: LogRecord) {
        if !record.level.passes(self.verbosity) {
            return;
        }
        match &self.sink {
            LogSink::Callback(callback) => {
                let mut callback = callback.lock().unwrap();
                (*callback)(record);
            }
            LogSink::Tracing => forward_to_tracing(&record),
        }
    }
}

/// `Note` sits between info and warn, `Fatal` above error; the facade has
/// no slots for either, so they ride the neighboring level with a marker.
fn forward_to_tracing(record: &LogRecord) {
    let logger = record.logger.as_str();
    match record.level {
        Loglevel::Trace => trace!(%logger, "{}", record.message),
        Loglevel::Debug => debug!(%logger, "{}", record.message),
        Loglevel::Info => info!(%logger, "{}", record.message),
        Loglevel::Note => info!(%logger, "[NOTE] {}", record.message),
        Loglevel::Warn => warn!(%logger, "{}", record.message),
        Loglevel::Error => error!(%logger, "{}", record.message),
        Loglevel::Fatal => error!(%logger, "[FATAL] {}", record.message),
        Loglevel::Off => {}
    }
}
