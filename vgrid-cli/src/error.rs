//! Binary error type

use std::io;
use std::path::PathBuf;

use vgrid_lib::ConfigError;
use vgrid_lib::GridError;

/// Errors that end the demo.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No log directory available; pass --log-file")]
    NoLogDir,

    #[error("Failed to initialize logger: {0}")]
    Logger(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grid(#[from] GridError),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
