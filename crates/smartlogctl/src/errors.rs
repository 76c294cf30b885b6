//! Exit status for smartlogctl

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the config file cannot be read or parsed
pub const EXIT_CONFIG_ERROR: i32 = 78;

/// Exit code when no dataset source could be read
pub const EXIT_DATA_UNAVAILABLE: i32 = 69;
