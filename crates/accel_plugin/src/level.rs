use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity levels used throughout the simulation pipeline.
/// Higher-value variants are more severe. `Off` never appears on a record;
/// it only makes sense as a filter that rejects everything.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Loglevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Note = 3,
    Warn = 4,
    Error = 5,
    Fatal = 6,
    Off = 7,
}

impl Loglevel {
    /// Whether a record at this level passes a filter set to `filter`.
    pub fn passes(self, filter: Loglevel) -> bool {
        self != Loglevel::Off && self >= filter
    }
}
