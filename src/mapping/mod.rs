//! MIDI mapping client
//!
//! Owns the explicit registry of mapping sessions. Each session wraps one
//! receive handler registered on a [`MidiSource`]; the handler only forwards
//! messages into the store mailbox and never touches state itself.

pub mod center;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::MappingError;
use crate::midi::MidiNodeMessage;
use crate::state::{AppAction, MidiMappingEvent};

pub use center::{InputPort, MidiCenter};

/// Callback invoked for every message a source receives
pub type ReceiveHandler = Arc<dyn Fn(&MidiNodeMessage) + Send + Sync>;

/// Where a session posts the actions it produces
pub type ActionSink = Arc<dyn Fn(AppAction) + Send + Sync>;

/// Opaque handle returned by [`MidiSource::register_receive_handler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Key of a mapping session in the client registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something that delivers parsed MIDI messages to registered handlers
pub trait MidiSource: Send + Sync {
    fn register_receive_handler(&self, handler: ReceiveHandler) -> Result<HandlerId, MappingError>;

    /// Unknown ids are ignored
    fn unregister_receive_handler(&self, id: HandlerId);
}

/// One receive handler and its registration on a source
pub struct MidiMappingManager {
    source: Arc<dyn MidiSource>,
    handler: ReceiveHandler,
    handle: Option<HandlerId>,
}

impl MidiMappingManager {
    pub fn new(source: Arc<dyn MidiSource>, handler: ReceiveHandler) -> Self {
        Self {
            source,
            handler,
            handle: None,
        }
    }

    /// Register the handler, replacing any previous registration
    pub fn register(&mut self) -> Result<(), MappingError> {
        self.unregister();
        let id = self.source.register_receive_handler(self.handler.clone())?;
        self.handle = Some(id);
        Ok(())
    }

    pub fn unregister(&mut self) {
        if let Some(id) = self.handle.take() {
            self.source.unregister_receive_handler(id);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for MidiMappingManager {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Registry of mapping sessions keyed by [`SessionId`]
pub struct MidiMappingClient {
    source: Arc<dyn MidiSource>,
    managers: HashMap<SessionId, MidiMappingManager>,
}

impl MidiMappingClient {
    pub fn new(source: Arc<dyn MidiSource>) -> Self {
        Self {
            source,
            managers: HashMap::new(),
        }
    }

    /// Create a session whose handler forwards every message to `sink`
    ///
    /// An existing session with the same id is torn down first.
    pub fn create(&mut self, id: SessionId, sink: ActionSink) -> Result<(), MappingError> {
        if self.managers.remove(&id).is_some() {
            debug!("Replacing mapping session '{}'", id);
        }

        let handler: ReceiveHandler = Arc::new(move |msg: &MidiNodeMessage| {
            debug!("ccnum: {}, value: {}", msg.ccnum(), msg.ccval());
            sink(AppAction::MidiMapping(
                MidiMappingEvent::IncomingMidimapSourceEvent(*msg),
            ));
        });

        let mut manager = MidiMappingManager::new(self.source.clone(), handler);
        manager.register()?;
        self.managers.insert(id.clone(), manager);

        info!("Mapping session '{}' created", id);
        Ok(())
    }

    /// Unregister and forget a session. Returns false if it did not exist.
    pub fn destroy(&mut self, id: &SessionId) -> bool {
        match self.managers.remove(id) {
            Some(mut manager) => {
                manager.unregister();
                info!("Mapping session '{}' destroyed", id);
                true
            }
            None => false,
        }
    }

    /// Re-register the handler of an existing session
    pub fn start_incoming(&mut self, id: &SessionId) -> Result<(), MappingError> {
        match self.managers.get_mut(id) {
            Some(manager) => {
                manager.register()?;
                info!("Incoming MIDI started for '{}'", id);
            }
            None => warn!("No mapping session '{}' to start", id),
        }
        Ok(())
    }

    /// Unregister the handler but keep the session
    pub fn stop_incoming(&mut self, id: &SessionId) {
        match self.managers.get_mut(id) {
            Some(manager) => {
                manager.unregister();
                info!("Incoming MIDI stopped for '{}'", id);
            }
            None => warn!("No mapping session '{}' to stop", id),
        }
    }

    /// True when the session exists and its handler is registered
    pub fn is_active(&self, id: &SessionId) -> bool {
        self.managers
            .get(id)
            .map(MidiMappingManager::is_registered)
            .unwrap_or(false)
    }

    pub fn session_count(&self) -> usize {
        self.managers.len()
    }

    /// Destroy every session
    pub fn destroy_all(&mut self) {
        let ids: Vec<SessionId> = self.managers.keys().cloned().collect();
        for id in ids {
            self.destroy(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Source that refuses registrations
    struct Unavailable;

    impl MidiSource for Unavailable {
        fn register_receive_handler(
            &self,
            _handler: ReceiveHandler,
        ) -> Result<HandlerId, MappingError> {
            Err(MappingError::NotAvailable("no MIDI center".to_string()))
        }

        fn unregister_receive_handler(&self, _id: HandlerId) {}
    }

    fn collecting_sink() -> (ActionSink, Arc<Mutex<Vec<AppAction>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: ActionSink = Arc::new(move |action: AppAction| sink_seen.lock().push(action));
        (sink, seen)
    }

    fn incoming(cc: u8, value: u8) -> AppAction {
        AppAction::MidiMapping(MidiMappingEvent::IncomingMidimapSourceEvent(
            MidiNodeMessage::control_change(0, cc, value),
        ))
    }

    #[test]
    fn test_create_forwards_messages() {
        let center = Arc::new(MidiCenter::new());
        let mut client = MidiMappingClient::new(center.clone());
        let (sink, seen) = collecting_sink();
        let id = SessionId::new("main");

        client.create(id.clone(), sink).unwrap();
        assert!(client.is_active(&id));
        assert_eq!(center.handler_count(), 1);

        assert!(center.inject(&[0xB0, 41, 127]));
        assert_eq!(seen.lock().as_slice(), &[incoming(41, 127)]);
    }

    #[test]
    fn test_stop_and_start_incoming() {
        let center = Arc::new(MidiCenter::new());
        let mut client = MidiMappingClient::new(center.clone());
        let (sink, seen) = collecting_sink();
        let id = SessionId::new("main");
        client.create(id.clone(), sink).unwrap();

        client.stop_incoming(&id);
        assert!(!client.is_active(&id));
        assert_eq!(client.session_count(), 1);
        center.inject(&[0xB0, 0, 10]);
        assert!(seen.lock().is_empty());

        client.start_incoming(&id).unwrap();
        client.start_incoming(&id).unwrap();
        // Restarting twice must not double-register
        assert_eq!(center.handler_count(), 1);
        center.inject(&[0xB0, 0, 20]);
        assert_eq!(seen.lock().as_slice(), &[incoming(0, 20)]);
    }

    #[test]
    fn test_destroy_unregisters() {
        let center = Arc::new(MidiCenter::new());
        let mut client = MidiMappingClient::new(center.clone());
        let (sink, _seen) = collecting_sink();
        let id = SessionId::new("main");
        client.create(id.clone(), sink).unwrap();

        assert!(client.destroy(&id));
        assert!(!client.destroy(&id));
        assert_eq!(center.handler_count(), 0);
        assert!(!client.is_active(&id));
    }

    #[test]
    fn test_create_twice_replaces_session() {
        let center = Arc::new(MidiCenter::new());
        let mut client = MidiMappingClient::new(center.clone());
        let id = SessionId::new("main");

        let (first, first_seen) = collecting_sink();
        let (second, second_seen) = collecting_sink();
        client.create(id.clone(), first).unwrap();
        client.create(id.clone(), second).unwrap();

        assert_eq!(center.handler_count(), 1);
        center.inject(&[0xB0, 1, 5]);
        assert!(first_seen.lock().is_empty());
        assert_eq!(second_seen.lock().len(), 1);
    }

    #[test]
    fn test_unavailable_source() {
        let mut client = MidiMappingClient::new(Arc::new(Unavailable));
        let (sink, _seen) = collecting_sink();
        let id = SessionId::new("main");

        let err = client.create(id.clone(), sink).unwrap_err();
        assert!(matches!(err, MappingError::NotAvailable(_)));
        assert_eq!(client.session_count(), 0);
    }

    #[test]
    fn test_destroy_all() {
        let center = Arc::new(MidiCenter::new());
        let mut client = MidiMappingClient::new(center.clone());
        for name in ["a", "b"] {
            let (sink, _seen) = collecting_sink();
            client.create(SessionId::new(name), sink).unwrap();
        }
        assert_eq!(center.handler_count(), 2);

        client.destroy_all();
        assert_eq!(client.session_count(), 0);
        assert_eq!(center.handler_count(), 0);
    }
}
