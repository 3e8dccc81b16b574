//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration does not match the resource schema
pub const VALIDATION_ERROR: i32 = 2;

/// Render error - the manifest could not be produced
pub const RENDER_ERROR: i32 = 3;

/// CRD error - a CustomResourceDefinition could not be imported
pub const CRD_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// State error - the state file is unreadable or inconsistent
pub const STATE_ERROR: i32 = 6;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Configuration error - invalid configuration file (sysexits.h EX_CONFIG)
pub const CONFIG_ERROR: i32 = 78;
