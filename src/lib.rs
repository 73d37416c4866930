//! ssot-render: resolve a single service descriptor and render deployment
//! manifests from it.
//!
//! The pipeline, in order:
//!
//! 1. [`tree`] - parse the descriptor into a Config Tree
//! 2. [`stage`] - merge the active stage's overrides
//! 3. [`resolve`] - resolve fields that reference other fields
//! 4. [`enrich`] - fill in derived defaults (networks, routing port, host flag)
//! 5. [`render`] - render template directories with override priority
//! 6. [`docs`] - embed the rendered artifacts into the documentation page

pub mod check;
pub mod cli;
pub mod commands;
pub mod config;
pub mod docs;
pub mod enrich;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod sources;
pub mod stage;
pub mod template;
pub mod tree;
