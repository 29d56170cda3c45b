//! Window placement derived from a resolved monitor and its preference
//!
//! These values are all the window layer gets to see: where to put the
//! role's window and how to show it.

use serde::Serialize;

use crate::config::RolePreference;
use crate::types::{MonitorDescriptor, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowMode {
    Normal,
    Maximized,
    /// Borderless popup covering the monitor bounds
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// `None` lets the window system pick the position and size
    pub rect: Option<Rect>,
    pub mode: ShowMode,
}

impl Placement {
    fn system_default(mode: ShowMode) -> Self {
        Self { rect: None, mode }
    }

    fn at(rect: Rect, mode: ShowMode) -> Self {
        Self {
            rect: Some(rect),
            mode,
        }
    }
}

/// Main window: primary honors `show_maximized`, a secondary is always maximized on its bounds
pub fn main_window_placement(monitor: &MonitorDescriptor, preference: &RolePreference) -> Placement {
    if monitor.is_primary {
        placement_on_primary(preference)
    } else {
        Placement::at(monitor.bounds, ShowMode::Maximized)
    }
}

/// Canvas window: like main, except `show_fullscreen` wins on any monitor
pub fn canvas_window_placement(monitor: &MonitorDescriptor, preference: &RolePreference) -> Placement {
    if preference.show_fullscreen {
        Placement::at(monitor.bounds, ShowMode::Fullscreen)
    } else if monitor.is_primary {
        placement_on_primary(preference)
    } else {
        Placement::at(monitor.bounds, ShowMode::Maximized)
    }
}

fn placement_on_primary(preference: &RolePreference) -> Placement {
    if preference.show_maximized {
        Placement::system_default(ShowMode::Maximized)
    } else {
        Placement::system_default(ShowMode::Normal)
    }
}
