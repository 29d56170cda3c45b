use x11rb::protocol::randr::Notify;
use x11rb::protocol::Event::{self, RandrNotify, RandrScreenChangeNotify};

/// A monitor layout change seen after startup. Roles are not re-resolved;
/// the user is asked to restart instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyNotice {
    ScreenResized { width: u16, height: u16 },
    CrtcChanged,
    OutputChanged,
}

pub fn handle_event(event: &Event) -> Option<TopologyNotice> {
    match event {
        RandrScreenChangeNotify(event) => Some(TopologyNotice::ScreenResized {
            width: event.width,
            height: event.height,
        }),
        RandrNotify(event) => classify_notify(event.sub_code),
        _ => None,
    }
}

/// Only CRTC and output changes move monitors around
fn classify_notify(sub_code: Notify) -> Option<TopologyNotice> {
    if sub_code == Notify::CRTC_CHANGE {
        Some(TopologyNotice::CrtcChanged)
    } else if sub_code == Notify::OUTPUT_CHANGE {
        Some(TopologyNotice::OutputChanged)
    } else {
        None
    }
}
