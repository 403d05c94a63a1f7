//! Completion events of the asynchronous operations
//!
//! Listeners are registered per event type and called with the concrete
//! event. Publishing snapshots the listener list and releases the lock
//! before dispatch, so a listener may itself publish or subscribe.

use std::any::{Any, TypeId};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// Marker for values that can travel on an [`EventBus`]
pub trait Event: Any + Send + Sync {}

type Listener = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Typed publish/subscribe bus
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<AHashMap<TypeId, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` for every published `E`
    pub fn subscribe<E, F>(&self, listener: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                listener(event);
            }
        });
        self.listeners
            .lock()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(listener);
    }

    pub fn publish<E: Event>(&self, event: E) {
        let listeners = self
            .listeners
            .lock()
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();
        let event: &dyn Any = &event;
        for listener in &listeners {
            listener(event);
        }
    }
}

/// A dataset replaced the previous one
#[derive(Debug, Clone)]
pub struct DatasetLoaded {
    pub sheet_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub generation: u64,
}

/// An upload request failed
#[derive(Debug, Clone)]
pub struct UploadFailed {
    pub file_name: String,
    pub error: String,
}

/// A rule-debug preview response was applied
#[derive(Debug, Clone)]
pub struct DebugPreviewReady {
    pub delayed: usize,
    pub attributes: usize,
    pub ignored: usize,
}

#[derive(Debug, Clone)]
pub struct DebugPreviewFailed {
    pub error: String,
}

/// A response arrived for a request that is no longer current
#[derive(Debug, Clone)]
pub struct StaleResponseDiscarded {
    pub sequence: u64,
}

impl Event for DatasetLoaded {}
impl Event for UploadFailed {}
impl Event for DebugPreviewReady {}
impl Event for DebugPreviewFailed {}
impl Event for StaleResponseDiscarded {}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(row_count: usize) -> DatasetLoaded {
        DatasetLoaded {
            sheet_name: "时间线".to_string(),
            row_count,
            column_count: 3,
            generation: 1,
        }
    }

    #[test]
    fn test_publish_reaches_matching_subscribers_only() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.subscribe(move |event: &DatasetLoaded| sink.lock().push(event.row_count));

        bus.publish(loaded(3));
        bus.publish(UploadFailed {
            file_name: "a.xlsx".to_string(),
            error: "HTTP 500".to_string(),
        });

        assert_eq!(*seen.lock(), vec![3]);
    }

    #[test]
    fn test_listener_can_publish_and_subscribe() {
        let bus = Arc::new(EventBus::new());
        let failures = Arc::new(Mutex::new(0));

        let sink = failures.clone();
        bus.subscribe(move |_: &UploadFailed| *sink.lock() += 1);

        let inner = bus.clone();
        bus.subscribe(move |event: &DatasetLoaded| {
            inner.publish(UploadFailed {
                file_name: event.sheet_name.clone(),
                error: "follow-up".to_string(),
            });
            inner.subscribe(|_: &StaleResponseDiscarded| {});
        });

        bus.publish(loaded(1));
        assert_eq!(*failures.lock(), 1);
    }
}
