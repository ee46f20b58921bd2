//! State and action types for the store

use serde::Serialize;
use std::fmt;

use crate::midi::MidiNodeMessage;

// ============================================================================
// Transport
// ============================================================================

/// Transport button status
///
/// `StoppedState` and `PlayingState` are stable; the other four are
/// transient "engaged" states waiting for a release. The discriminant is the
/// frame index of the transport button graphic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransportStatus {
    StopClicked = 0,
    StoppedState = 1,
    PlayClicked = 2,
    PlayingState = 3,
    RestartPlay = 4,
    StoppingPlay = 5,
}

impl TransportStatus {
    pub fn raw_value(self) -> u8 {
        self as u8
    }

    pub fn is_transient(self) -> bool {
        !matches!(
            self,
            TransportStatus::StoppedState | TransportStatus::PlayingState
        )
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportStatus::StopClicked => "stopClicked",
            TransportStatus::StoppedState => "stoppedState",
            TransportStatus::PlayClicked => "playClicked",
            TransportStatus::PlayingState => "playingState",
            TransportStatus::RestartPlay => "restartPlay",
            TransportStatus::StoppingPlay => "stoppingPlay",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransportMode {
    Playing,
    Stopped,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Playing => f.write_str("playing"),
            TransportMode::Stopped => f.write_str("stopped"),
        }
    }
}

/// Which button is currently held down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionStatus {
    PressingPlay,
    PressingStop,
    NonAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransportState {
    pub status: TransportStatus,
    pub mode: TransportMode,
    pub action_status: ActionStatus,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            status: TransportStatus::StoppedState,
            mode: TransportMode::Stopped,
            action_status: ActionStatus::NonAction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportAction {
    PlayButtonEngaged,
    StopButtonEngaged,
    ButtonReleased,
    Play,
    Stop,
}

// ============================================================================
// Controls
// ============================================================================

/// Two independent slider values, 0-127
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlsState {
    pub cc1_value: f64,
    pub cc2_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlsAction {
    Slider1Changed(f64),
    Slider2Changed(f64),
}

// ============================================================================
// App
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AppState {
    pub controls: ControlsState,
    pub transport: TransportState,
}

/// Events produced by the MIDI mapping client
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiMappingEvent {
    IncomingMidimapSourceEvent(MidiNodeMessage),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppAction {
    Controls(ControlsAction),
    Transport(TransportAction),
    MidiMapping(MidiMappingEvent),
    /// Open the mapping session
    OnAppear,
    /// Tear the mapping session down
    OnDisappear,
    /// Re-register the session's receive handler
    StartIncomingMidi,
    /// Unregister the receive handler but keep the session
    StopIncomingMidi,
}

impl From<ControlsAction> for AppAction {
    fn from(action: ControlsAction) -> Self {
        AppAction::Controls(action)
    }
}

impl From<TransportAction> for AppAction {
    fn from(action: TransportAction) -> Self {
        AppAction::Transport(action)
    }
}
