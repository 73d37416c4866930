//! Exit code constants for the ssot-render CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid configuration)
//! - 2: Descriptor parse failure
//! - 3: Resolution failure (absent parent, circular reference)
//! - 4: Template render failure
//! - 5: Filesystem failure
//! - 6: Rendered artifacts failed validation (`check`)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, unknown stage, invalid engine config.
pub const USER_ERROR: i32 = 1;

/// The descriptor or snapshot is not valid structured text.
pub const PARSE_FAILURE: i32 = 2;

/// A placeholder could not be resolved against the tree.
pub const RESOLUTION_FAILURE: i32 = 3;

/// A template failed to render; nothing was written.
pub const RENDER_FAILURE: i32 = 4;

/// Reading sources or writing artifacts failed.
pub const IO_FAILURE: i32 = 5;

/// One or more service/stage combinations produced invalid artifacts.
pub const VALIDATION_FAILURE: i32 = 6;
