//! Process exit codes
//!
//! Usage errors are reported by clap itself (exit code 2 with usage text).

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - invalid project config, descriptor or input
pub const VALIDATION_ERROR: i32 = 2;

/// Sync error - IDE configuration could not be generated
pub const SYNC_ERROR: i32 = 3;

/// Pack error - resolution, integrity or install failure
pub const PACK_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Network error - registry or download request failed
pub const NETWORK_ERROR: i32 = 6;
