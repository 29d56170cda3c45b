//! Per-role display preferences
//!
//! One record per role key, read at every startup and written back after
//! resolution. The resolution engine is the only code that mutates them
//! outside of explicit user edits.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Persisted preference for one role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePreference {
    #[serde(default)]
    pub show_on_primary: bool,
    #[serde(default)]
    pub show_maximized: bool,
    /// Only meaningful for the canvas role
    #[serde(default)]
    pub show_fullscreen: bool,
    /// Pinned monitor device name; empty means no explicit pin
    #[serde(
        default,
        deserialize_with = "deserialize_monitor_name",
        serialize_with = "serialize_monitor_name"
    )]
    pub monitor_name: String,
}

/// Accepts a string or null; null becomes the empty string
fn deserialize_monitor_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Writes an unset name as null
fn serialize_monitor_name<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if value.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.serialize_str(value)
    }
}

impl RolePreference {
    /// First-run defaults for a role
    pub fn default_for(role: Role) -> Self {
        Self {
            show_fullscreen: role == Role::Canvas,
            ..Self::default()
        }
    }

    pub fn has_pin(&self) -> bool {
        !self.monitor_name.is_empty()
    }
}

/// The main/canvas preference pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePreferences {
    pub main: RolePreference,
    pub canvas: RolePreference,
}

impl Default for RolePreferences {
    fn default() -> Self {
        Self {
            main: RolePreference::default_for(Role::Main),
            canvas: RolePreference::default_for(Role::Canvas),
        }
    }
}

impl RolePreferences {
    pub fn get(&self, role: Role) -> &RolePreference {
        match role {
            Role::Main => &self.main,
            Role::Canvas => &self.canvas,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut RolePreference {
        match role {
            Role::Main => &mut self.main,
            Role::Canvas => &mut self.canvas,
        }
    }
}
