use serde_json::Value;
use tokio::sync::broadcast;

/// Events the core publishes for external collaborators (logging, metrics,
/// future transports) to subscribe to. Not part of the oneM2M protocol
/// surface — purely an in-process observability hook.
#[derive(Clone, Debug)]
pub enum CoreEvent {
    CreateResource { ri: String, snapshot: Value },
    UpdateResource { ri: String, snapshot: Value },
    DeleteResource { ri: String },
    RegisteredToRemoteCse { csi: String },
    DeregisteredFromRemoteCse { csi: String },
    RemoteCseHasRegistered { csi: String },
    RemoteCseHasDeregistered { csi: String },
    LogWarning { message: String },
    LogError { message: String },
}

/// A typed in-process publish/subscribe bus. Subscribers register with
/// [`EventBus::subscribe`]; publication never blocks on subscribers being
/// slow (lagged receivers simply miss older events, per
/// `tokio::sync::broadcast`'s semantics).
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: CoreEvent) {
        // No receivers is the common case at startup; not an error.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
