//! midimap - MIDI Control-Change to slider/transport mapper
//!
//! Incoming CC messages are routed to two slider values and a play/stop
//! transport that follows a press/release protocol. All state lives in one
//! actor; MIDI callbacks only post actions into its mailbox.

pub mod cli;
pub mod config;
pub mod error;
pub mod mapping;
pub mod midi;
pub mod paths;
pub mod router;
pub mod sniffer;
pub mod state;
pub mod view;

pub use error::{ConfigError, MappingError};
pub use router::CcMap;
pub use state::{AppAction, AppState, StoreHandle};
