use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::plugin::PluginError;

/// Arbitrary data payload exchanged between the host and the accelerator,
/// and attached to out-of-band commands. The structured half is free-form
/// JSON; the unstructured half is an ordered list of binary arguments.
/// The core never interprets either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbData {
    #[serde(default = "empty_object")]
    pub json: Value,
    #[serde(default)]
    pub args: Vec<Vec<u8>>,
}

fn empty_object() -> Value {
    json!({})
}

impl Default for ArbData {
    fn default() -> Self {
        ArbData {
            json: json!({}),
            args: Vec::new(),
        }
    }
}

impl ArbData {
    pub fn new(json: Value, args: Vec<Vec<u8>>) -> Self {
        ArbData { json, args }
    }
}

impl From<Value> for ArbData {
    fn from(json: Value) -> Self {
        ArbData {
            json,
            args: Vec::new(),
        }
    }
}

impl From<()> for ArbData {
    fn from(_: ()) -> Self {
        ArbData::default()
    }
}

/// Out-of-band command routed to a specific pipeline member. The interface
/// identifier selects the (vendor-specific) extension, the operation
/// identifier the command within it; plugins ignore interfaces they do not
/// recognize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbCmd {
    interface: String,
    operation: String,
    pub data: ArbData,
}

impl ArbCmd {
    /// Both identifiers must be non-empty and match `[a-zA-Z0-9_]+`.
    pub fn new(
        interface: impl Into<String>,
        operation: impl Into<String>,
        data: ArbData,
    ) -> Result<Self, PluginError> {
        let interface = interface.into();
        let operation = operation.into();
        check_identifier(&interface)?;
        check_identifier(&operation)?;
        Ok(ArbCmd {
            interface,
            operation,
            data,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

fn check_identifier(ident: &str) -> Result<(), PluginError> {
    if !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(PluginError::Identifier(ident.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_is_empty_object() {
        let data = ArbData::default();
        assert_eq!(data.json, json!({}));
        assert!(data.args.is_empty());
    }

    #[test]
    fn cmd_identifiers_are_validated() {
        let cmd = ArbCmd::new("my_iface", "op_1", ArbData::default()).unwrap();
        assert_eq!(cmd.interface(), "my_iface");
        assert_eq!(cmd.operation(), "op_1");

        assert!(matches!(
            ArbCmd::new("", "op", ArbData::default()),
            Err(PluginError::Identifier(_))
        ));
        assert!(matches!(
            ArbCmd::new("my-iface", "op", ArbData::default()),
            Err(PluginError::Identifier(_))
        ));
        assert!(matches!(
            ArbCmd::new("iface", "op with spaces", ArbData::default()),
            Err(PluginError::Identifier(_))
        ));
    }

    #[test]
    fn payload_survives_serde() {
        let data = ArbData::new(json!({"depth": 3}), vec![vec![0, 159, 146]]);
        let text = serde_json::to_string(&data).unwrap();
        assert_eq!(serde_json::from_str::<ArbData>(&text).unwrap(), data);
    }
}
