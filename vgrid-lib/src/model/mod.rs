//! Row and ordering types shared by the engine, data sources and renderers.

mod row;
mod sort;

pub use row::*;
pub use sort::*;
