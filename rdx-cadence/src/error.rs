//! Error types for the Cadence library.
//!
//! The phase state machine itself never fails; commands that do not apply are
//! ignored. Errors only arise at the edges: loading or saving configuration
//! and driving the engine's control loop.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform has no per-user configuration directory.
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// The configuration could not be encoded as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the `TimerMachine` handle.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MachineError {
    /// `run` was called on a machine whose control loop was already spawned.
    #[error("The timer machine is already running")]
    AlreadyRunning,
}
