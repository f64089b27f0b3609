use accel_plugin::plugin::PluginError;
use thiserror::Error;

pub type Result<T, E = SimulatorError> = std::result::Result<T, E>;

/// Errors reported by the simulator core. Nothing is retried
/// automatically; callers correct the condition and reissue the call.
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// Malformed or contradictory configuration, detected before any
    /// simulation resource exists.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not legal in the current lifecycle state.
    #[error("{0}")]
    IllegalState(String),

    /// A blocking protocol call can never make forward progress because
    /// host and accelerator are waiting on each other.
    #[error("deadlock: {0}")]
    Deadlock(String),

    /// Failure inside the simulation engine or one of its plugins.
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

impl From<PluginError> for SimulatorError {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::Deadlock(msg) => SimulatorError::Deadlock(msg),
            other => SimulatorError::Engine(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_deadlocks_stay_deadlocks() {
        let err: SimulatorError = PluginError::Deadlock("both sides blocked".into()).into();
        assert!(matches!(err, SimulatorError::Deadlock(_)));

        let err: SimulatorError = PluginError::Other("boom".into()).into();
        assert!(matches!(err, SimulatorError::Engine(_)));
    }

    #[test]
    fn display_keeps_state_messages_bare() {
        let err = SimulatorError::IllegalState("No simulation is currently running".into());
        assert_eq!(err.to_string(), "No simulation is currently running");

        let err = SimulatorError::InvalidArgument("bad spec".into());
        assert_eq!(err.to_string(), "invalid argument: bad spec");
    }
}
