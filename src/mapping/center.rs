//! MIDI center - receive-handler table fed by a midir input port
//!
//! The center parses every incoming buffer once and fans it out to all
//! registered handlers. Handlers run on the MIDI driver thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use super::{HandlerId, MidiSource, ReceiveHandler};
use crate::error::MappingError;
use crate::midi::{format_hex, MidiNodeMessage};

#[derive(Default)]
pub struct MidiCenter {
    handlers: Mutex<HashMap<HandlerId, ReceiveHandler>>,
    next_id: AtomicU64,
}

impl MidiCenter {
    /// Create a detached center; only injected messages are delivered
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver raw bytes as if they had arrived on the input port
    ///
    /// Returns false when the bytes do not parse as a MIDI message.
    pub fn inject(&self, data: &[u8]) -> bool {
        match MidiNodeMessage::parse(data) {
            Some(msg) => {
                self.deliver(&msg);
                true
            }
            None => {
                debug!("Failed to parse MIDI: {}", format_hex(data));
                false
            }
        }
    }

    /// Fan a parsed message out to every registered handler
    pub fn deliver(&self, msg: &MidiNodeMessage) {
        // Snapshot so handlers may (un)register without deadlocking
        let handlers: Vec<ReceiveHandler> = self.handlers.lock().values().cloned().collect();
        trace!("Delivering {} to {} handler(s)", msg, handlers.len());
        for handler in handlers {
            handler(msg);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Open an input port whose name contains `pattern` (case-insensitive)
    pub fn connect_input(
        self: &Arc<Self>,
        client_name: &str,
        pattern: &str,
    ) -> Result<InputPort> {
        let midi_in = MidiInput::new(&format!("{}-Input", client_name))
            .context("Failed to create MIDI input")?;

        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (port, port_name) = find_input_port(&midi_in, pattern)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", pattern))?;

        info!("Connecting to input port: {}", port_name);

        let center = Arc::clone(self);
        let connection = midi_in
            .connect(
                &port,
                client_name,
                move |_timestamp, data, _| {
                    center.inject(data);
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        Ok(InputPort {
            connection: Some(connection),
            name: port_name,
        })
    }
}

impl MidiSource for MidiCenter {
    fn register_receive_handler(&self, handler: ReceiveHandler) -> Result<HandlerId, MappingError> {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().insert(id, handler);
        debug!("Registered receive handler {:?}", id);
        Ok(id)
    }

    fn unregister_receive_handler(&self, id: HandlerId) {
        if self.handlers.lock().remove(&id).is_some() {
            debug!("Unregistered receive handler {:?}", id);
        }
    }
}

/// An open midir input connection feeding a [`MidiCenter`]
pub struct InputPort {
    connection: Option<MidiInputConnection<()>>,
    name: String,
}

impl InputPort {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the connection
    pub fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            info!("Closed input port: {}", self.name);
        }
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        self.close();
    }
}

/// Find an input port by substring match
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    let pattern = pattern.to_lowercase();
    midi_in.ports().into_iter().find_map(|port| {
        let name = midi_in.port_name(&port).ok()?;
        if name.to_lowercase().contains(&pattern) {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            Some((port, name))
        } else {
            None
        }
    })
}

/// Names of all MIDI input ports currently visible
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("midimap-scanner").context("Failed to create MIDI input")?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}
