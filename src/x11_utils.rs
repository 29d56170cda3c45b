use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as RandrExt};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11;
use crate::error::ConfigError;
use crate::event_handler::{handle_event, TopologyNotice};
use crate::monitors::MonitorEnumerator;
use crate::types::{MonitorDescriptor, MonitorId, Rect};

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_workarea: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_workarea: conn.intern_atom(false, x11::NET_WORKAREA)
                .context("Failed to intern _NET_WORKAREA atom")?
                .reply()
                .context("Failed to get reply for _NET_WORKAREA atom")?
                .atom,
        })
    }
}

/// Live X display used as the monitor source
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    atoms: CachedAtoms,
}

impl X11Display {
    /// Connect to `$DISPLAY` and check for RandR 1.5 (GetMonitors)
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let root = conn.setup().roots[screen_num].root;
        info!(screen = screen_num, "successfully connected to x11");

        let version = conn
            .randr_query_version(x11::RANDR_MAJOR, x11::RANDR_MINOR)
            .context("Failed to query RandR version")?
            .reply()
            .context("Failed to get reply for RandR version query")?;
        if (version.major_version, version.minor_version) < (x11::RANDR_MAJOR, x11::RANDR_MINOR) {
            anyhow::bail!(
                "RandR {}.{} is too old, {}.{} or newer is required",
                version.major_version,
                version.minor_version,
                x11::RANDR_MAJOR,
                x11::RANDR_MINOR
            );
        }

        let atoms = CachedAtoms::new(&conn)?;
        Ok(Self { conn, root, atoms })
    }

    /// Work area of the first desktop, if the window manager publishes one
    fn workarea(&self) -> Result<Option<Rect>> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms.net_workarea,
                AtomEnum::CARDINAL,
                0,
                x11::WORKAREA_LEN,
            )
            .context("Failed to query _NET_WORKAREA property")?
            .reply()
            .context("Failed to get reply for _NET_WORKAREA query")?;

        let values: Vec<u32> = match reply.value32() {
            Some(values) => values.collect(),
            None => return Ok(None),
        };
        Ok(match values.as_slice() {
            &[x, y, width, height] => Some(Rect::new(x as i32, y as i32, width, height)),
            _ => None,
        })
    }

    fn atom_name(&self, atom: Atom) -> Result<String> {
        let reply = self.conn
            .get_atom_name(atom)
            .context(format!("Failed to query name of atom {}", atom))?
            .reply()
            .context(format!("Failed to get reply for name of atom {}", atom))?;
        Ok(String::from_utf8_lossy(&reply.name).into_owned())
    }

    /// Active monitors in server order
    pub fn monitors(&self) -> Result<Vec<MonitorDescriptor>> {
        let workarea = self.workarea()?;
        let reply = self.conn
            .randr_get_monitors(self.root, true)
            .context("Failed to query RandR monitors")?
            .reply()
            .context("Failed to get reply for RandR monitors query")?;

        let mut monitors = Vec::with_capacity(reply.monitors.len());
        for info in &reply.monitors {
            let bounds = Rect::new(info.x as i32, info.y as i32, info.width as u32, info.height as u32);
            let work = workarea
                .and_then(|area| bounds.intersect(&area))
                .unwrap_or(bounds);
            let device_name = self.atom_name(info.name)?;
            debug!(name = %device_name, bounds = %bounds, work = %work, primary = info.primary, "discovered monitor");

            monitors.push(MonitorDescriptor {
                id: MonitorId(info.name),
                bounds,
                work,
                is_primary: info.primary,
                device_name,
            });
        }
        Ok(monitors)
    }

    /// Block forever, calling `on_notice` for every monitor layout change
    pub fn watch_topology_changes(&self, mut on_notice: impl FnMut(TopologyNotice)) -> Result<()> {
        self.conn
            .randr_select_input(
                self.root,
                randr::NotifyMask::SCREEN_CHANGE
                    | randr::NotifyMask::CRTC_CHANGE
                    | randr::NotifyMask::OUTPUT_CHANGE,
            )
            .context("Failed to select RandR change notifications")?;
        self.conn.flush().context("Failed to flush X11 connection")?;
        info!("Watching for monitor changes");

        loop {
            let event = self.conn
                .wait_for_event()
                .context("Failed to read X11 event")?;
            if let Some(notice) = handle_event(&event) {
                on_notice(notice);
            }
        }
    }
}

impl MonitorEnumerator for X11Display {
    fn enumerate(&self) -> Result<Vec<MonitorDescriptor>, ConfigError> {
        self.monitors()
            .map_err(|e| ConfigError::EnumerationFailure(format!("{e:#}")))
    }
}
