//! Engine configuration for ssot-render.
//!
//! This module defines the `EngineConfig` struct, loaded from an optional YAML
//! file passed via `--config`. Every directory name, reserved key and default
//! network that the pipeline stages need lives here and is threaded into them
//! as a parameter.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::EngineConfig;
pub use types::NetworkDefaults;
