//! StoreHandle - public API for the StoreActor
//!
//! Cheap to clone. Sending actions never blocks, so the handle can be used
//! from plain threads (the REPL, MIDI callbacks) as well as from tasks.

use tokio::sync::{mpsc, oneshot, watch};

use super::commands::StoreCommand;
use super::types::{AppAction, AppState};
use crate::router::CcMap;

#[derive(Clone)]
pub struct StoreHandle {
    cmd_tx: mpsc::UnboundedSender<StoreCommand>,
    state_rx: watch::Receiver<AppState>,
}

impl StoreHandle {
    pub fn new(
        cmd_tx: mpsc::UnboundedSender<StoreCommand>,
        state_rx: watch::Receiver<AppState>,
    ) -> Self {
        Self { cmd_tx, state_rx }
    }

    /// Spawn a new StoreActor and return a handle
    pub fn spawn(source: std::sync::Arc<dyn crate::mapping::MidiSource>, cc_map: CcMap) -> Self {
        super::actor::StoreActor::spawn(source, cc_map)
    }

    // =========================================================================
    // Fire-and-forget
    // =========================================================================

    /// Post an action into the mailbox
    ///
    /// Returns false once the actor has stopped.
    pub fn send(&self, action: impl Into<AppAction>) -> bool {
        self.cmd_tx
            .send(StoreCommand::Dispatch(action.into()))
            .is_ok()
    }

    /// Replace the CC routing table
    pub fn update_mapping(&self, cc_map: CcMap) {
        let _ = self.cmd_tx.send(StoreCommand::UpdateMapping(cc_map));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// State after every previously sent command has been applied
    ///
    /// Returns None if the actor has stopped.
    pub async fn state(&self) -> Option<AppState> {
        let (response_tx, response_rx) = oneshot::channel();
        self.cmd_tx
            .send(StoreCommand::GetState {
                response: response_tx,
            })
            .ok()?;
        response_rx.await.ok()
    }

    /// Last published state, without a round trip
    pub fn snapshot(&self) -> AppState {
        *self.state_rx.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state_rx.clone()
    }

    pub async fn is_session_active(&self) -> bool {
        let (response_tx, response_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(StoreCommand::IsSessionActive {
                response: response_tx,
            })
            .is_err()
        {
            return false;
        }
        response_rx.await.unwrap_or(false)
    }

    /// Destroy all sessions and stop the actor
    pub async fn shutdown(&self) {
        let (response_tx, response_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(StoreCommand::Shutdown {
                response: response_tx,
            })
            .is_ok()
        {
            let _ = response_rx.await;
        }
    }
}
