//! Persisted role preferences
//!
//! - **preferences**: the per-role record and its main/canvas pair
//! - **store**: keyed storage for those records (JSON file or in-memory)

pub mod preferences;
pub mod store;

// Re-export commonly used types
pub use preferences::{RolePreference, RolePreferences};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore};
