//! Event bus abstraction for decoupled event emission.
//!
//! The arbiter reports what it did (volume observations, now-playing status)
//! through this trait so the core can be driven from tests, from the daemon,
//! or from any future UI without knowing who listens.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Trait for emitting events to subscribers.
pub trait EventBus: Send + Sync {
    /// Emit an event with a JSON payload.
    ///
    /// # Arguments
    /// * `topic` - Event name/topic (e.g., "volume:observed")
    /// * `payload` - JSON payload to emit
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

/// Type alias for shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize `event` and emit it on `topic`.
///
/// Serialization of the DTOs in this crate cannot fail in practice; if a
/// caller passes something that does, the event is dropped and logged.
pub fn emit_event<T: Serialize>(bus: &dyn EventBus, topic: &str, event: &T) {
    match serde_json::to_value(event) {
        Ok(payload) => bus.emit(topic, payload),
        Err(e) => tracing::error!(topic, error = %e, "failed to serialize event"),
    }
}

/// In-memory event bus for testing.
///
/// Captures all emitted events for later inspection.
#[derive(Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<EmittedEvent>>,
}

/// A captured event from InMemoryEventBus.
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in emission order.
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.lock().clone()
    }

    /// Captured events for a single topic, in emission order.
    pub fn events_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.lock()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    /// Deserialize every payload captured on `topic` into `T`.
    ///
    /// Payloads that don't match `T` are skipped.
    pub fn decode<T: serde::de::DeserializeOwned>(&self, topic: &str) -> Vec<T> {
        self.events_for(topic)
            .into_iter()
            .filter_map(|e| serde_json::from_value(e.payload).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EmittedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.lock().push(EmittedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// No-op event bus that discards all events.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {}
}
