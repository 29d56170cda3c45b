//! Fatal errors raised while resolving display roles.

use thiserror::Error;

/// Errors surfaced by initialization.
///
/// Everything else in the resolution path has a defined fallback, so these
/// are the only ways a startup can fail.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The monitor enumeration call itself failed.
    #[error("Failure enumerating displays: {0}")]
    EnumerationFailure(String),

    /// Enumeration succeeded but reported no monitors.
    #[error("No displays found!")]
    NoDisplaysFound,

    /// Reading or writing the preference store failed.
    #[error("Preference store failure: {0}")]
    StoreFailure(String),
}
