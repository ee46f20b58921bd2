//! CC router - maps incoming Control Change messages to app actions
//!
//! Routing is a pure lookup: the router never touches state. Anything that
//! is not a Control Change, or does not match the table, is dropped.

use tracing::trace;

use crate::midi::MidiNodeMessage;
use crate::state::{AppAction, ControlsAction, TransportAction};

/// Controller table used by [`CcMap::route`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcMap {
    pub slider1_cc: u8,
    pub slider2_cc: u8,
    pub play_cc: u8,
    pub stop_cc: u8,
    /// Value sent by a button when pressed
    pub engage_value: u8,
    /// Value sent by a button when let go
    pub release_value: u8,
    /// 0-based channel filter, None accepts every channel
    pub channel: Option<u8>,
}

impl Default for CcMap {
    fn default() -> Self {
        Self {
            slider1_cc: 0,
            slider2_cc: 1,
            play_cc: 41,
            stop_cc: 42,
            engage_value: 127,
            release_value: 0,
            channel: None,
        }
    }
}

impl CcMap {
    /// Map one message to the action it triggers, if any
    pub fn route(&self, msg: &MidiNodeMessage) -> Option<AppAction> {
        if !msg.is_control_change() {
            return None;
        }
        if let Some(channel) = self.channel {
            if msg.channel != channel {
                trace!("Dropping {} (channel filter {})", msg, channel + 1);
                return None;
            }
        }

        let (cc, value) = (msg.ccnum(), msg.ccval());

        let action = if cc == self.slider1_cc {
            ControlsAction::Slider1Changed(f64::from(value)).into()
        } else if cc == self.slider2_cc {
            ControlsAction::Slider2Changed(f64::from(value)).into()
        } else if cc == self.play_cc && value == self.engage_value {
            TransportAction::PlayButtonEngaged.into()
        } else if cc == self.stop_cc && value == self.engage_value {
            TransportAction::StopButtonEngaged.into()
        } else if (cc == self.play_cc || cc == self.stop_cc) && value == self.release_value {
            TransportAction::ButtonReleased.into()
        } else {
            trace!("Unmapped {}", msg);
            return None;
        };

        Some(action)
    }
}
