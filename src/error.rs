//! Crate-wide error type.

use crate::config::{ConfigError, PinRole};

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors from the MAX3000 device abstractions and the build-time tooling.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum Error {
    /// The background device task could not be spawned.
    #[cfg(not(feature = "host"))]
    #[display("failed to spawn task: {_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    /// Writing to one of the driver's output lines failed.
    #[display("failed to drive `{}`", _0.key())]
    Pin(#[error(not(source))] PinRole),

    /// The configuration was rejected.
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),

    /// A board or page index did not exist.
    #[display("index out of bounds")]
    IndexOutOfBounds,

    /// The configuration text was not valid YAML for the schema.
    #[cfg(feature = "host")]
    #[display("invalid configuration document: {_0}")]
    Yaml(serde_yaml::Error),
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

#[cfg(feature = "host")]
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Yaml(error)
    }
}
