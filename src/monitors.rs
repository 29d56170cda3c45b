//! Monitor topology sources
//!
//! The resolution engine only needs a snapshot of the attached monitors. It
//! gets one from a [`MonitorEnumerator`]: the live X11 display (see
//! `x11_utils`) or a JSON description on disk for headless use.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::types::{MonitorDescriptor, MonitorId, Rect};

/// Produces the current monitor topology in one blocking call
pub trait MonitorEnumerator {
    fn enumerate(&self) -> Result<Vec<MonitorDescriptor>, ConfigError>;
}

/// Entry of a JSON topology file
#[derive(Debug, Deserialize)]
struct MonitorEntry {
    device_name: String,
    bounds: Rect,
    /// Defaults to `bounds`
    #[serde(default)]
    work: Option<Rect>,
    #[serde(default)]
    primary: bool,
}

/// Parse a JSON array of monitors, keeping file order as enumeration order
pub fn parse_topology(contents: &str) -> Result<Vec<MonitorDescriptor>, serde_json::Error> {
    let entries: Vec<MonitorEntry> = serde_json::from_str(contents)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| MonitorDescriptor {
            id: MonitorId(index as u32),
            work: entry.work.unwrap_or(entry.bounds),
            bounds: entry.bounds,
            is_primary: entry.primary,
            device_name: entry.device_name,
        })
        .collect())
}

/// Reads the topology from a JSON file
#[derive(Debug, Clone)]
pub struct FileMonitorEnumerator {
    path: PathBuf,
}

impl FileMonitorEnumerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MonitorEnumerator for FileMonitorEnumerator {
    fn enumerate(&self) -> Result<Vec<MonitorDescriptor>, ConfigError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::EnumerationFailure(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let monitors = parse_topology(&contents).map_err(|e| {
            ConfigError::EnumerationFailure(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        for monitor in &monitors {
            debug!(name = %monitor.device_name, bounds = %monitor.bounds, primary = monitor.is_primary, "discovered monitor");
        }
        info!(path = %self.path.display(), count = monitors.len(), "Loaded monitor topology from file");
        Ok(monitors)
    }
}

/// Fixed topology for tests
#[cfg(test)]
pub(crate) struct StaticMonitorEnumerator(pub Result<Vec<MonitorDescriptor>, String>);

#[cfg(test)]
impl MonitorEnumerator for StaticMonitorEnumerator {
    fn enumerate(&self) -> Result<Vec<MonitorDescriptor>, ConfigError> {
        self.0.clone().map_err(ConfigError::EnumerationFailure)
    }
}
