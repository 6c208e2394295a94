//! Configuration error types

/// Errors raised when a [`GridConfig`](crate::GridConfig) cannot drive the
/// index/pixel math.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Row height is zero, negative, or not a finite number.
    #[error("Row height must be a positive finite number, got {0}")]
    InvalidRowHeight(f64),

    /// Viewport height is negative or not a finite number.
    #[error("Viewport height must be a non-negative finite number, got {0}")]
    InvalidViewportHeight(f64),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(String),
}
