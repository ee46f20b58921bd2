//! Command-line REPL
//!
//! Replaces the on-screen transport button and sliders: `play`/`stop` press
//! a button, `release` lets it go, and `cc` injects raw Control Change
//! messages through the MIDI center exactly as hardware would.

use std::sync::Arc;

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::mapping::MidiCenter;
use crate::midi::MidiNodeMessage;
use crate::state::{AppAction, ControlsAction, StoreHandle, TransportAction};
use crate::view;

/// A parsed REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Stop,
    Release,
    /// Inject a Control Change on channel 1
    Cc { controller: u8, value: u8 },
    Slider1(f64),
    Slider2(f64),
    MidiOn,
    MidiOff,
    State,
    Json,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | stop          press the play / stop button
  release              let go of the pressed button
  cc <num> <value>     inject a Control Change (0-127 each)
  slider1 <value>      set slider 1 (clamped to 0-127)
  slider2 <value>      set slider 2 (clamped to 0-127)
  midi on | midi off   start / stop incoming MIDI for the session
  state | json         print the current state
  help | quit";

/// Parse one input line
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let head = parts.next().ok_or_else(|| "empty command".to_string())?;
    let args: Vec<&str> = parts.collect();

    let command = match (head.to_lowercase().as_str(), args.as_slice()) {
        ("play", []) => Command::Play,
        ("stop", []) => Command::Stop,
        ("release" | "lift", []) => Command::Release,
        ("cc", [controller, value]) => Command::Cc {
            controller: parse_data_byte(controller)?,
            value: parse_data_byte(value)?,
        },
        ("slider1", [value]) => Command::Slider1(parse_slider(value)?),
        ("slider2", [value]) => Command::Slider2(parse_slider(value)?),
        ("midi", ["on"]) => Command::MidiOn,
        ("midi", ["off"]) => Command::MidiOff,
        ("state", []) => Command::State,
        ("json", []) => Command::Json,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(format!("unknown command: {}", line.trim())),
    };
    Ok(command)
}

fn parse_data_byte(s: &str) -> Result<u8, String> {
    match s.parse::<u8>() {
        Ok(v) if v <= 127 => Ok(v),
        _ => Err(format!("expected 0-127, got '{}'", s)),
    }
}

fn parse_slider(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("expected a number, got '{}'", s))?;
    if value.is_nan() {
        return Err("slider value cannot be NaN".to_string());
    }
    Ok(value.clamp(0.0, 127.0))
}

/// Run the REPL on the calling thread until `quit` or end of input
pub fn run_repl(store: StoreHandle, center: Arc<MidiCenter>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "Type 'help' for commands".dimmed());

    loop {
        let line = match rl.readline("midimap> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.as_str().red());
                continue;
            }
        };
        debug!(?command, "REPL command");

        if !execute(&command, &store, &center)? {
            break;
        }
    }

    Ok(())
}

/// Apply a command. Returns false when the REPL should exit.
fn execute(command: &Command, store: &StoreHandle, center: &MidiCenter) -> Result<bool> {
    match command {
        Command::Play => {
            store.send(TransportAction::PlayButtonEngaged);
        }
        Command::Stop => {
            store.send(TransportAction::StopButtonEngaged);
        }
        Command::Release => {
            store.send(TransportAction::ButtonReleased);
        }
        Command::Cc { controller, value } => {
            center.deliver(&MidiNodeMessage::control_change(0, *controller, *value));
        }
        Command::Slider1(value) => {
            store.send(ControlsAction::Slider1Changed(*value));
        }
        Command::Slider2(value) => {
            store.send(ControlsAction::Slider2Changed(*value));
        }
        Command::MidiOn => {
            store.send(AppAction::StartIncomingMidi);
        }
        Command::MidiOff => {
            store.send(AppAction::StopIncomingMidi);
        }
        Command::State => println!("{}", view::render(&store.snapshot())),
        Command::Json => println!("{}", serde_json::to_string_pretty(&store.snapshot())?),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transport_commands() {
        assert_eq!(parse_command("play"), Ok(Command::Play));
        assert_eq!(parse_command("  STOP "), Ok(Command::Stop));
        assert_eq!(parse_command("lift"), Ok(Command::Release));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_cc() {
        assert_eq!(
            parse_command("cc 41 127"),
            Ok(Command::Cc {
                controller: 41,
                value: 127
            })
        );
        assert!(parse_command("cc 41 128").is_err());
        assert!(parse_command("cc 41").is_err());
        assert!(parse_command("cc x 1").is_err());
    }

    #[test]
    fn test_parse_slider_clamps() {
        assert_eq!(parse_command("slider1 64"), Ok(Command::Slider1(64.0)));
        assert_eq!(parse_command("slider2 300"), Ok(Command::Slider2(127.0)));
        assert_eq!(parse_command("slider2 -5"), Ok(Command::Slider2(0.0)));
        assert!(parse_command("slider1 NaN").is_err());
    }

    #[test]
    fn test_parse_midi_toggle() {
        assert_eq!(parse_command("midi on"), Ok(Command::MidiOn));
        assert_eq!(parse_command("midi off"), Ok(Command::MidiOff));
        assert!(parse_command("midi maybe").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse_command("").is_err());
        assert!(parse_command("rewind").is_err());
        assert!(parse_command("play now").is_err());
    }

    #[tokio::test]
    async fn test_execute_drives_store() {
        use crate::router::CcMap;
        use crate::state::TransportMode;

        let center = Arc::new(MidiCenter::new());
        let store = StoreHandle::spawn(center.clone(), CcMap::default());
        store.send(AppAction::OnAppear);
        assert!(store.is_session_active().await);

        for line in ["cc 41 127", "cc 41 0", "slider1 12"] {
            let command = parse_command(line).unwrap();
            assert!(execute(&command, &store, &center).unwrap());
        }
        assert!(!execute(&Command::Quit, &store, &center).unwrap());

        let state = store.state().await.unwrap();
        assert_eq!(state.transport.mode, TransportMode::Playing);
        assert_eq!(state.controls.cc1_value, 12.0);
    }
}
