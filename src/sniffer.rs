//! MIDI port listing and traffic monitor

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use colored::*;

use crate::mapping::center::list_input_ports;
use crate::mapping::{MidiCenter, MidiSource, ReceiveHandler};
use crate::midi::{format_hex, MidiNodeMessage};
use crate::router::CcMap;

/// Print all visible input ports
pub fn list_ports_formatted() -> Result<()> {
    println!("{}", "=== MIDI Input Ports ===".bold().cyan());
    let ports = list_input_ports()?;
    if ports.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (index, name) in ports.iter().enumerate() {
        println!("  [{}] {}", index.to_string().yellow(), name);
    }
    Ok(())
}

/// Format one monitored message together with what the router makes of it
pub fn format_event(elapsed_ms: u128, msg: &MidiNodeMessage, cc_map: &CcMap) -> String {
    let routed = match cc_map.route(msg) {
        Some(action) => format!("=> {:?}", action),
        None => "=> (dropped)".to_string(),
    };
    let bytes = msg.to_bytes().map(|b| format_hex(&b)).unwrap_or_default();
    format!(
        "[{:08}ms] {:<8} {:<24} {}",
        elapsed_ms,
        bytes,
        msg.to_string(),
        routed
    )
}

/// Register a handler that prints every message the center delivers
pub fn attach_monitor(center: &MidiCenter, cc_map: CcMap) -> Result<()> {
    let start = Instant::now();
    let handler: ReceiveHandler = Arc::new(move |msg: &MidiNodeMessage| {
        let line = format_event(start.elapsed().as_millis(), msg, &cc_map);
        println!("{}", line.dimmed());
    });
    center.register_receive_handler(handler)?;
    Ok(())
}
