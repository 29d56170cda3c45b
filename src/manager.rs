//! Startup orchestration around the resolution engine
//!
//! Runs once, before any window exists: enumerate monitors, load the stored
//! preferences, resolve, write the corrected preferences back and keep the
//! result for the window layer to query.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{PreferenceStore, RolePreference, RolePreferences};
use crate::error::ConfigError;
use crate::monitors::MonitorEnumerator;
use crate::placement::{self, Placement};
use crate::resolution::{self, Correction};
use crate::types::{MonitorDescriptor, Role};

/// Resolved roles for this process
#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    main: MonitorDescriptor,
    canvas: MonitorDescriptor,
    preferences: RolePreferences,
    corrections: Vec<Correction>,
}

/// Serializable snapshot of the resolved state
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub main: RoleSummary<'a>,
    pub canvas: RoleSummary<'a>,
    pub corrections: &'a [Correction],
}

#[derive(Debug, Serialize)]
pub struct RoleSummary<'a> {
    pub monitor: &'a MonitorDescriptor,
    pub preference: &'a RolePreference,
    pub placement: Placement,
}

impl ConfigurationManager {
    /// Resolve both roles and persist the corrected preferences.
    ///
    /// An empty topology fails before the store is read or written. Store
    /// read errors fall back to defaults; write errors are fatal.
    pub fn initialize(
        enumerator: &dyn MonitorEnumerator,
        store: &mut dyn PreferenceStore,
    ) -> Result<Self, ConfigError> {
        let mut preferences = RolePreferences::default();

        let topology = enumerator.enumerate()?;
        if topology.is_empty() {
            return Err(ConfigError::NoDisplaysFound);
        }
        info!(count = topology.len(), "Enumerated monitors");

        for role in Role::ALL {
            match store.get(role.key()) {
                Ok(Some(stored)) => *preferences.get_mut(role) = stored,
                Ok(None) => info!(role = %role, "No stored preference, using defaults"),
                Err(e) => warn!(role = %role, error = %e, "Failed to read preference, using defaults"),
            }
        }

        let resolution = resolution::resolve(topology, preferences)?;
        for correction in &resolution.corrections {
            if correction.touches_preferences() {
                info!(?correction, "Corrected preference");
            } else {
                warn!(?correction, "Normalized monitor topology");
            }
        }

        for role in Role::ALL {
            store.put(role.key(), resolution.preferences.get(role))?;
        }

        for role in Role::ALL {
            let monitor = resolution.monitor(role);
            info!(role = %role, monitor = %monitor.device_name, bounds = %monitor.bounds, primary = monitor.is_primary, "Resolved role");
        }

        Ok(Self {
            main: resolution.main,
            canvas: resolution.canvas,
            preferences: resolution.preferences,
            corrections: resolution.corrections,
        })
    }

    pub fn main_monitor(&self) -> &MonitorDescriptor {
        &self.main
    }

    pub fn canvas_monitor(&self) -> &MonitorDescriptor {
        &self.canvas
    }

    pub fn preferences(&self) -> &RolePreferences {
        &self.preferences
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn compute_main_window_placement(&self) -> Placement {
        placement::main_window_placement(&self.main, &self.preferences.main)
    }

    pub fn compute_canvas_window_placement(&self) -> Placement {
        placement::canvas_window_placement(&self.canvas, &self.preferences.canvas)
    }

    pub fn summary(&self) -> Summary<'_> {
        Summary {
            main: RoleSummary {
                monitor: &self.main,
                preference: &self.preferences.main,
                placement: self.compute_main_window_placement(),
            },
            canvas: RoleSummary {
                monitor: &self.canvas,
                preference: &self.preferences.canvas,
                placement: self.compute_canvas_window_placement(),
            },
            corrections: &self.corrections,
        }
    }
}
