//! Commands accepted by the store actor mailbox

use tokio::sync::oneshot;

use super::types::{AppAction, AppState};
use crate::router::CcMap;

/// Commands for the store actor
///
/// `Dispatch` and `UpdateMapping` are fire-and-forget; the rest answer
/// through a oneshot channel once every earlier command has been applied.
#[derive(Debug)]
pub enum StoreCommand {
    /// Run an action through the reducers
    Dispatch(AppAction),

    /// Swap the CC routing table (config hot-reload)
    UpdateMapping(CcMap),

    /// Read the current state
    GetState {
        response: oneshot::Sender<AppState>,
    },

    /// Whether the mapping session is open and receiving
    IsSessionActive {
        response: oneshot::Sender<bool>,
    },

    /// Destroy all sessions and stop the actor
    Shutdown {
        response: oneshot::Sender<()>,
    },
}
