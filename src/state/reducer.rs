//! Pure reducers
//!
//! Each reducer mutates its slice of state and returns the follow-up work
//! the store has to perform. No I/O happens here.

use tracing::debug;

use super::types::{
    ActionStatus, AppAction, AppState, ControlsAction, ControlsState, MidiMappingEvent,
    TransportAction, TransportMode, TransportState, TransportStatus,
};
use crate::router::CcMap;

/// Follow-up work returned by a reducer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    /// Feed another action back into the store before the next mailbox message
    Send(AppAction),
    /// Create the mapping session and register its receive handler
    CreateSession,
    /// Unregister and drop the mapping session
    DestroySession,
    StartIncoming,
    StopIncoming,
}

/// Transport state machine
///
/// Returns the action a release resolves to (`Play` or `Stop`), if any.
pub fn reduce_transport(
    state: &mut TransportState,
    action: TransportAction,
) -> Option<TransportAction> {
    match action {
        TransportAction::PlayButtonEngaged => {
            match state.status {
                TransportStatus::StoppedState => {
                    state.action_status = ActionStatus::PressingPlay;
                    state.status = TransportStatus::PlayClicked;
                }
                TransportStatus::PlayingState => {
                    state.action_status = ActionStatus::PressingPlay;
                    state.status = TransportStatus::RestartPlay;
                }
                _ => {}
            }
            None
        }
        TransportAction::StopButtonEngaged => {
            match state.status {
                TransportStatus::StoppedState => {
                    state.action_status = ActionStatus::PressingStop;
                    state.status = TransportStatus::StopClicked;
                }
                TransportStatus::PlayingState => {
                    state.action_status = ActionStatus::PressingStop;
                    state.status = TransportStatus::StoppingPlay;
                }
                _ => {}
            }
            None
        }
        TransportAction::ButtonReleased => match state.action_status {
            ActionStatus::PressingPlay => Some(TransportAction::Play),
            ActionStatus::PressingStop => Some(TransportAction::Stop),
            ActionStatus::NonAction => None,
        },
        TransportAction::Play => {
            state.mode = TransportMode::Playing;
            state.status = TransportStatus::PlayingState;
            state.action_status = ActionStatus::NonAction;
            None
        }
        TransportAction::Stop => {
            state.mode = TransportMode::Stopped;
            state.status = TransportStatus::StoppedState;
            state.action_status = ActionStatus::NonAction;
            None
        }
    }
}

pub fn reduce_controls(state: &mut ControlsState, action: ControlsAction) {
    match action {
        ControlsAction::Slider1Changed(value) => state.cc1_value = value,
        ControlsAction::Slider2Changed(value) => state.cc2_value = value,
    }
}

/// Top-level reducer combining controls, transport and the mapping session
pub fn reduce_app(state: &mut AppState, action: AppAction, cc_map: &CcMap) -> Effect {
    match action {
        AppAction::Controls(action) => {
            reduce_controls(&mut state.controls, action);
            Effect::None
        }
        AppAction::Transport(action) => {
            match reduce_transport(&mut state.transport, action) {
                Some(next) => Effect::Send(AppAction::Transport(next)),
                None => Effect::None,
            }
        }
        AppAction::MidiMapping(MidiMappingEvent::IncomingMidimapSourceEvent(msg)) => {
            debug!("ccnum: {}, value: {}", msg.ccnum(), msg.ccval());
            match cc_map.route(&msg) {
                Some(action) => Effect::Send(action),
                None => Effect::None,
            }
        }
        AppAction::OnAppear => Effect::CreateSession,
        AppAction::OnDisappear => Effect::DestroySession,
        AppAction::StartIncomingMidi => Effect::StartIncoming,
        AppAction::StopIncomingMidi => Effect::StopIncoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiNodeMessage;
    use proptest::prelude::*;

    /// Apply an action and run synchronous follow-ups, like the store does
    fn send(state: &mut TransportState, action: TransportAction) {
        let mut next = Some(action);
        while let Some(action) = next {
            next = reduce_transport(state, action);
        }
    }

    fn playing() -> TransportState {
        TransportState {
            status: TransportStatus::PlayingState,
            mode: TransportMode::Playing,
            action_status: ActionStatus::NonAction,
        }
    }

    #[test]
    fn test_play_engage_from_stopped() {
        let mut state = TransportState::default();
        assert_eq!(
            reduce_transport(&mut state, TransportAction::PlayButtonEngaged),
            None
        );
        assert_eq!(state.status, TransportStatus::PlayClicked);
        assert_eq!(state.action_status, ActionStatus::PressingPlay);
        assert_eq!(state.mode, TransportMode::Stopped);
    }

    #[test]
    fn test_engagements_from_playing() {
        let mut state = playing();
        reduce_transport(&mut state, TransportAction::PlayButtonEngaged);
        assert_eq!(state.status, TransportStatus::RestartPlay);
        assert_eq!(state.action_status, ActionStatus::PressingPlay);

        let mut state = playing();
        reduce_transport(&mut state, TransportAction::StopButtonEngaged);
        assert_eq!(state.status, TransportStatus::StoppingPlay);
        assert_eq!(state.action_status, ActionStatus::PressingStop);
        assert_eq!(state.mode, TransportMode::Playing);
    }

    #[test]
    fn test_stop_engage_from_stopped() {
        let mut state = TransportState::default();
        reduce_transport(&mut state, TransportAction::StopButtonEngaged);
        assert_eq!(state.status, TransportStatus::StopClicked);
        assert_eq!(state.action_status, ActionStatus::PressingStop);
    }

    #[test]
    fn test_release_emits_play_or_stop() {
        let mut state = TransportState::default();
        reduce_transport(&mut state, TransportAction::PlayButtonEngaged);
        let before = state;
        assert_eq!(
            reduce_transport(&mut state, TransportAction::ButtonReleased),
            Some(TransportAction::Play)
        );
        // Release alone does not touch state
        assert_eq!(state, before);

        let mut state = playing();
        reduce_transport(&mut state, TransportAction::StopButtonEngaged);
        assert_eq!(
            reduce_transport(&mut state, TransportAction::ButtonReleased),
            Some(TransportAction::Stop)
        );
    }

    #[test]
    fn test_release_without_press_is_noop() {
        let mut state = TransportState::default();
        assert_eq!(
            reduce_transport(&mut state, TransportAction::ButtonReleased),
            None
        );
        assert_eq!(state, TransportState::default());
    }

    #[test]
    fn test_engage_in_transient_state_is_ignored() {
        let mut state = TransportState::default();
        reduce_transport(&mut state, TransportAction::PlayButtonEngaged);
        let clicked = state;

        reduce_transport(&mut state, TransportAction::PlayButtonEngaged);
        assert_eq!(state, clicked);
        reduce_transport(&mut state, TransportAction::StopButtonEngaged);
        assert_eq!(state, clicked);
    }

    #[test]
    fn test_full_cycle() {
        let mut state = TransportState::default();
        send(&mut state, TransportAction::PlayButtonEngaged);
        send(&mut state, TransportAction::ButtonReleased);
        assert_eq!(state, playing());

        send(&mut state, TransportAction::StopButtonEngaged);
        send(&mut state, TransportAction::ButtonReleased);
        assert_eq!(state, TransportState::default());
    }

    #[test]
    fn test_restart_keeps_playing() {
        let mut state = playing();
        send(&mut state, TransportAction::PlayButtonEngaged);
        send(&mut state, TransportAction::ButtonReleased);
        assert_eq!(state, playing());
    }

    #[test]
    fn test_controls() {
        let mut state = ControlsState::default();
        reduce_controls(&mut state, ControlsAction::Slider1Changed(64.0));
        reduce_controls(&mut state, ControlsAction::Slider2Changed(12.0));
        assert_eq!(state.cc1_value, 64.0);
        assert_eq!(state.cc2_value, 12.0);
    }

    #[test]
    fn test_app_reducer_routes_incoming_cc() {
        let mut state = AppState::default();
        let msg = MidiNodeMessage::control_change(0, 41, 127);
        let effect = reduce_app(
            &mut state,
            AppAction::MidiMapping(MidiMappingEvent::IncomingMidimapSourceEvent(msg)),
            &CcMap::default(),
        );
        assert_eq!(
            effect,
            Effect::Send(AppAction::Transport(TransportAction::PlayButtonEngaged))
        );
        // Routing itself never mutates state
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_app_reducer_session_effects() {
        let mut state = AppState::default();
        let map = CcMap::default();
        assert_eq!(reduce_app(&mut state, AppAction::OnAppear, &map), Effect::CreateSession);
        assert_eq!(reduce_app(&mut state, AppAction::OnDisappear, &map), Effect::DestroySession);
        assert_eq!(
            reduce_app(&mut state, AppAction::StartIncomingMidi, &map),
            Effect::StartIncoming
        );
        assert_eq!(
            reduce_app(&mut state, AppAction::StopIncomingMidi, &map),
            Effect::StopIncoming
        );
    }

    #[derive(Debug, Clone, Copy)]
    enum Press {
        Play,
        Stop,
    }

    fn press_strategy() -> impl Strategy<Value = Press> {
        prop_oneof![Just(Press::Play), Just(Press::Stop)]
    }

    proptest! {
        #[test]
        fn prop_mode_follows_last_completed_press(
            presses in proptest::collection::vec(press_strategy(), 0..64)
        ) {
            let mut state = TransportState::default();
            for press in &presses {
                let engage = match press {
                    Press::Play => TransportAction::PlayButtonEngaged,
                    Press::Stop => TransportAction::StopButtonEngaged,
                };
                send(&mut state, engage);
                send(&mut state, TransportAction::ButtonReleased);
                prop_assert!(!state.status.is_transient());
                prop_assert_eq!(state.action_status, ActionStatus::NonAction);
            }

            let expected = match presses.last() {
                Some(Press::Play) => TransportMode::Playing,
                _ => TransportMode::Stopped,
            };
            prop_assert_eq!(state.mode, expected);
        }

        #[test]
        fn prop_slider1_takes_any_value(
            value in 0u8..=127,
            prior in 0u8..=127,
        ) {
            let map = CcMap::default();
            let mut state = AppState::default();
            state.controls.cc1_value = f64::from(prior);

            let msg = MidiNodeMessage::control_change(0, 0, value);
            let effect = reduce_app(
                &mut state,
                AppAction::MidiMapping(MidiMappingEvent::IncomingMidimapSourceEvent(msg)),
                &map,
            );
            if let Effect::Send(action) = effect {
                reduce_app(&mut state, action, &map);
            }
            prop_assert_eq!(state.controls.cc1_value, f64::from(value));
        }
    }
}
