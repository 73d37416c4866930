//! Error types for ssot-render.
//!
//! Uses thiserror for derive macros. Every variant maps to its own exit code so
//! callers scripting the CLI can tell a bad descriptor from a broken template.

use crate::exit_codes;
use crate::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for resolution and rendering.
#[derive(Error, Debug)]
pub enum SsotError {
    /// Malformed descriptor or snapshot text.
    #[error("parse error in {origin}: {message}")]
    Parse { origin: String, message: String },

    /// A placeholder walked through an absent parent, or the tree references
    /// itself in a way that never settles.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A template source directory does not exist. Callers log and skip it.
    #[error("template source not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A template failed to render.
    #[error("failed to render {template}: {message}")]
    Render { template: String, message: String },

    /// Filesystem failure while reading sources or writing artifacts.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid arguments or engine configuration.
    #[error("{0}")]
    User(String),

    /// Rendered artifacts did not pass validation.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl SsotError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SsotError::Parse { .. } => exit_codes::PARSE_FAILURE,
            SsotError::Resolution(_) => exit_codes::RESOLUTION_FAILURE,
            SsotError::TemplateNotFound(_) => exit_codes::IO_FAILURE,
            SsotError::Render { .. } => exit_codes::RENDER_FAILURE,
            SsotError::Io { .. } => exit_codes::IO_FAILURE,
            SsotError::User(_) => exit_codes::USER_ERROR,
            SsotError::Validation(_) => exit_codes::VALIDATION_FAILURE,
        }
    }

    /// Classify a template failure in `origin` (a file or a descriptor field).
    ///
    /// Lookups through a missing parent are resolution problems in the
    /// descriptor; everything else is a problem with the template itself.
    pub fn template(origin: impl Into<String>, err: TemplateError) -> Self {
        match err {
            TemplateError::UndefinedParent { .. } => {
                SsotError::Resolution(format!("{}: {}", origin.into(), err))
            }
            other => SsotError::Render {
                template: origin.into(),
                message: other.to_string(),
            },
        }
    }

    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SsotError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for ssot-render operations.
pub type Result<T> = std::result::Result<T, SsotError>;
