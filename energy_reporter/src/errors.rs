use shared_utils::config::ConfigError;
use thiserror::Error;

use crate::{io::sink::SinkError, providers::ReadError};

/// The unified error type for the `energy_reporter` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, malformed or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied request field is missing or unusable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A metering device could not be read.
    #[error("Upstream read error: {0}")]
    UpstreamRead(#[from] ReadError),

    /// The sink could not be reached.
    #[error("Forwarding error: {0}")]
    Forwarding(#[from] SinkError),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
