use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::arb::{ArbCmd, ArbData};

/// The three pipeline stage roles, in front-to-back order.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PluginRole {
    Frontend,
    Operator,
    Backend,
}

impl PluginRole {
    /// Prefix implied when a CLI-style spec string names a bare executable,
    /// and used to derive interpreter names from script extensions.
    pub fn executable_prefix(self) -> &'static str {
        match self {
            PluginRole::Frontend => "qpipefe",
            PluginRole::Operator => "qpipeop",
            PluginRole::Backend => "qpipebe",
        }
    }
}

/// Implementation name, author, and version, as reported by a plugin
/// during its initialization handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub author: String,
    pub version: String,
}

impl PluginMetadata {
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        PluginMetadata {
            name: name.into(),
            author: author.into(),
            version: version.into(),
        }
    }
}

/// Errors that a plugin implementation can return.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PluginError {
    /// Identifiers must be non-empty and match `[a-zA-Z0-9_]+`.
    #[error("invalid identifier {0:?}, expected [a-zA-Z0-9_]+")]
    Identifier(String),

    /// A blocking call toward the host can never make forward progress.
    #[error("{0}")]
    Deadlock(String),

    /// The plugin returned an unspecified failure.
    #[error("plugin error: {0}")]
    Other(String),
}

/// Host-side capability handed to a frontend's run callback: blocking,
/// ordered data handoff in both directions between the accelerator and the
/// host process.
pub trait HostLink {
    fn send(&mut self, data: ArbData) -> Result<(), PluginError>;
    fn recv(&mut self) -> Result<ArbData, PluginError>;
}

/// Behavior definition for a plugin run as a managed thread inside the
/// host process, instead of as an external process. The engine drives the
/// callbacks; implementations only need to override the ones their role
/// supports.
pub trait PluginDefinition: Send {
    /// Role this definition can fill. Attaching it to a different pipeline
    /// slot is a configuration error.
    fn role(&self) -> PluginRole;

    fn metadata(&self) -> PluginMetadata;

    /// Invoked once with the configured initialization commands, before
    /// the simulation starts.
    fn on_initialize(&mut self, _cmds: &[ArbCmd]) -> Result<(), PluginError> {
        Ok(())
    }

    /// The accelerator's run callback. Only frontends execute this; it is
    /// entered when the host issues a start request and yields control.
    fn on_run(&mut self, _host: &mut dyn HostLink, _args: ArbData) -> Result<ArbData, PluginError> {
        Err(PluginError::Other(
            "plugin does not implement the run callback".into(),
        ))
    }

    /// Handles an out-of-band command addressed to this plugin.
    fn on_arb(&mut self, _cmd: ArbCmd) -> Result<ArbData, PluginError> {
        Ok(ArbData::default())
    }
}
