//! Error types

mod config;
mod grid;
mod source;

pub use config::*;
pub use grid::*;
pub use source::*;
