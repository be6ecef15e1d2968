//! Domain layer: value types, configuration and pure parsers.

pub mod config;
pub mod diagnostics;
pub mod edges;
pub mod errors;
pub mod ordering;
pub mod relay_line;
pub mod types;
