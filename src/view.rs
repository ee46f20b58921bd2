//! Terminal status line
//!
//! Stands in for the slider and transport widgets: every published state
//! change is printed as one line.

use chrono::Local;
use colored::*;
use tokio::sync::watch;

use crate::state::{AppState, TransportMode};

const BAR_WIDTH: usize = 16;

/// Render a 0-127 value as a fixed-width bar
pub fn slider_bar(value: f64, width: usize) -> String {
    let clamped = value.clamp(0.0, 127.0);
    let filled = ((clamped / 127.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

/// One-line summary of the state
pub fn render(state: &AppState) -> String {
    let transport = &state.transport;
    let mode = match transport.mode {
        TransportMode::Playing => format!("▶ {}", transport.mode).green().bold(),
        TransportMode::Stopped => format!("■ {}", transport.mode).red().bold(),
    };
    let status = if transport.status.is_transient() {
        transport.status.to_string().yellow()
    } else {
        transport.status.to_string().dimmed()
    };

    format!(
        "cc1 {} {:>3.0}  cc2 {} {:>3.0}  {} ({} #{})",
        slider_bar(state.controls.cc1_value, BAR_WIDTH).cyan(),
        state.controls.cc1_value,
        slider_bar(state.controls.cc2_value, BAR_WIDTH).cyan(),
        state.controls.cc2_value,
        mode,
        status,
        transport.status.raw_value(),
    )
}

/// Print the state every time it changes, until the store goes away
pub async fn run_status_printer(mut rx: watch::Receiver<AppState>) {
    println!("{} {}", timestamp(), render(&rx.borrow_and_update()));
    while rx.changed().await.is_ok() {
        let state = *rx.borrow_and_update();
        println!("{} {}", timestamp(), render(&state));
    }
}

fn timestamp() -> ColoredString {
    Local::now().format("[%H:%M:%S%.3f]").to_string().dimmed()
}
