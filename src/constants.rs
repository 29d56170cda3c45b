//! Application-wide constants
//!
//! String literals and X11 names used across the crate, kept in one place.

/// Preference file location
pub mod config {
    /// Directory under the per-user data dir
    pub const APP_DIR: &str = "display-roles";

    /// Preference file name
    pub const FILENAME: &str = "preferences.json";
}

/// Keys used in the preference store
pub mod keys {
    pub const MAIN: &str = "main";
    pub const CANVAS: &str = "canvas";
}

/// X11 / EWMH names
pub mod x11 {
    /// Minimum RandR version with GetMonitors
    pub const RANDR_MAJOR: u32 = 1;
    pub const RANDR_MINOR: u32 = 5;

    /// EWMH work area property on the root window (x, y, w, h per desktop)
    pub const NET_WORKAREA: &[u8] = b"_NET_WORKAREA";

    /// Number of CARDINALs describing one desktop's work area
    pub const WORKAREA_LEN: u32 = 4;
}

/// User-facing messages
pub mod messages {
    pub const TOPOLOGY_CHANGED: &str =
        "A change in the monitor settings has been detected. Please restart the application.";

    pub const INIT_FAILURE_TITLE: &str = "Failure initializing the application";
}

/// Logging
pub mod logging {
    /// Environment variable selecting the log level
    pub const LEVEL_ENV: &str = "LOG_LEVEL";
}
