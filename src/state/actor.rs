//! StoreActor - the single serialization point for all state changes
//!
//! Every mutation of [`AppState`] happens inside this actor's run loop.
//! MIDI callbacks, the REPL and config reloads only post commands into its
//! mailbox.
//!
//! ```text
//!  MIDI thread ──┐
//!  REPL thread ──┼──► command_rx ──► reduce_app ──► effects ──► watch<AppState>
//!  config      ──┘                      ▲              │
//!                                       └── Send(..) ──┘
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

use super::actor_handle::StoreHandle;
use super::commands::StoreCommand;
use super::reducer::{reduce_app, Effect};
use super::types::{AppAction, AppState};
use crate::mapping::{ActionSink, MidiMappingClient, MidiSource, SessionId};
use crate::router::CcMap;

/// Id of the session opened by `OnAppear`
pub const MAIN_SESSION: &str = "midi-mapping-client";

pub struct StoreActor {
    state: AppState,
    cc_map: CcMap,
    client: MidiMappingClient,
    session_id: SessionId,

    command_rx: mpsc::UnboundedReceiver<StoreCommand>,

    /// Weak so that live sessions do not keep the mailbox open
    command_tx: mpsc::WeakUnboundedSender<StoreCommand>,

    state_tx: watch::Sender<AppState>,

    /// Total actions reduced, follow-ups included
    action_count: u64,
}

impl StoreActor {
    /// Spawn the actor on the current runtime and return a handle
    pub fn spawn(source: Arc<dyn MidiSource>, cc_map: CcMap) -> StoreHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AppState::default());

        let actor = StoreActor {
            state: AppState::default(),
            cc_map,
            client: MidiMappingClient::new(source),
            session_id: SessionId::new(MAIN_SESSION),
            command_rx: cmd_rx,
            command_tx: cmd_tx.downgrade(),
            state_tx,
            action_count: 0,
        };

        tokio::spawn(actor.run());
        info!("StoreActor spawned");

        StoreHandle::new(cmd_tx, state_rx)
    }

    async fn run(mut self) {
        debug!("StoreActor run loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            trace!(?cmd, "Processing command");

            match cmd {
                StoreCommand::Dispatch(action) => self.dispatch(action),
                StoreCommand::UpdateMapping(cc_map) => {
                    info!("CC mapping updated");
                    self.cc_map = cc_map;
                }
                StoreCommand::GetState { response } => {
                    let _ = response.send(self.state);
                }
                StoreCommand::IsSessionActive { response } => {
                    let _ = response.send(self.client.is_active(&self.session_id));
                }
                StoreCommand::Shutdown { response } => {
                    debug!(
                        "Shutdown requested with {} open session(s)",
                        self.client.session_count()
                    );
                    self.client.destroy_all();
                    let _ = response.send(());
                    break;
                }
            }
        }

        self.client.destroy_all();
        info!(
            "StoreActor stopped after {} actions",
            self.action_count
        );
    }

    /// Reduce an action and every follow-up it produces, then publish
    ///
    /// Follow-ups run before the next mailbox command, so a release and the
    /// Play/Stop it resolves to cannot be split by other input.
    fn dispatch(&mut self, action: AppAction) {
        let mut queue = VecDeque::from([action]);

        while let Some(action) = queue.pop_front() {
            self.action_count += 1;
            trace!(?action, "Reducing");

            match reduce_app(&mut self.state, action, &self.cc_map) {
                Effect::None => {}
                Effect::Send(next) => queue.push_back(next),
                Effect::CreateSession => self.create_session(),
                Effect::DestroySession => {
                    self.client.destroy(&self.session_id);
                }
                Effect::StartIncoming => {
                    if let Err(e) = self.client.start_incoming(&self.session_id) {
                        error!("Failed to start incoming MIDI: {}", e);
                    }
                }
                Effect::StopIncoming => self.client.stop_incoming(&self.session_id),
            }
        }

        self.publish();
    }

    fn create_session(&mut self) {
        let tx = self.command_tx.clone();
        let sink: ActionSink = Arc::new(move |action: AppAction| {
            // Hand-off from the MIDI thread into the mailbox
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(StoreCommand::Dispatch(action));
            }
        });

        if let Err(e) = self.client.create(self.session_id.clone(), sink) {
            error!("Failed to create mapping session: {}", e);
        }
    }

    fn publish(&self) {
        let state = self.state;
        self.state_tx.send_if_modified(|current| {
            if *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
    }
}
