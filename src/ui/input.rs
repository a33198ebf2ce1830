use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

/// A one-shot flag that tasks can wait on.
#[derive(Debug)]
pub struct InputEvent {
    tx: watch::Sender<bool>,
}

impl InputEvent {
    fn new(set: bool) -> Self {
        Self {
            tx: watch::Sender::new(set),
        }
    }

    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the event is set. Returns at once if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|set| *set).await;
    }
}

/// Tracks user-input requests announced on an agent stream, so that an
/// input prompt waits until the renderer has shown everything before it.
#[derive(Debug, Default)]
pub struct UserInputManager {
    events: Mutex<HashMap<String, Arc<InputEvent>>>,
}

impl UserInputManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<InputEvent>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Event for `request_id`, created unset if nobody asked for it yet.
    pub fn event(&self, request_id: &str) -> Arc<InputEvent> {
        Arc::clone(
            self.events()
                .entry(request_id.to_string())
                .or_insert_with(|| Arc::new(InputEvent::new(false))),
        )
    }

    /// Mark `request_id` as seen. If no one waits on it yet the event is
    /// stored already set, so a later waiter does not block.
    pub fn notify_event_received(&self, request_id: &str) {
        let mut events = self.events();
        match events.get(request_id) {
            Some(event) => event.set(),
            None => {
                events.insert(request_id.to_string(), Arc::new(InputEvent::new(true)));
            }
        }
    }

    /// Wait until the renderer has reached `request_id`.
    pub async fn wait_for_event(&self, request_id: &str) {
        let event = self.event(request_id);
        event.wait().await;
    }
}
