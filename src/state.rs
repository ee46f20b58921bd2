//! State management - transport and slider state behind a single actor
//!
//! Reducers are pure functions over [`AppState`]; the [`StoreActor`] owns
//! the state, runs the reducers one action at a time and performs the
//! effects they return (follow-up actions, mapping session lifecycle).

mod actor;
mod actor_handle;
mod commands;
mod reducer;
mod types;

pub use actor::{StoreActor, MAIN_SESSION};
pub use actor_handle::StoreHandle;
pub use commands::StoreCommand;
pub use reducer::{reduce_app, reduce_controls, reduce_transport, Effect};
pub use types::{
    ActionStatus, AppAction, AppState, ControlsAction, ControlsState, MidiMappingEvent,
    TransportAction, TransportMode, TransportState, TransportStatus,
};
