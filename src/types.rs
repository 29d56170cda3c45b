use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::keys;

/// Rectangle in virtual-desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> i64 {
        self.x as i64
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn top(&self) -> i64 {
        self.y as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Overlapping region, or None when the rectangles don't overlap
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Opaque per-run monitor handle. Not stable across runs; use `device_name` for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub u32);

/// One attached monitor as reported by an enumerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorDescriptor {
    pub id: MonitorId,
    /// Full monitor rectangle
    pub bounds: Rect,
    /// Usable rectangle excluding panels/taskbars
    pub work: Rect,
    pub is_primary: bool,
    /// Stable identifier matched against persisted `monitor_name`
    pub device_name: String,
}

/// Logical display purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Control UI
    Main,
    /// Show/media surface
    Canvas,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Main, Role::Canvas];

    /// Preference store key
    pub fn key(self) -> &'static str {
        match self {
            Role::Main => keys::MAIN,
            Role::Canvas => keys::CANVAS,
        }
    }

    pub fn other(self) -> Role {
        match self {
            Role::Main => Role::Canvas,
            Role::Canvas => Role::Main,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role '{s}', expected 'main' or 'canvas'"))
    }
}
