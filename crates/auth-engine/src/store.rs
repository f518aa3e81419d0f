//! Event store holding the current [`AuthState`].
//!
//! `dispatch` reduces and publishes under one lock, so events are applied
//! one at a time in dispatch order and every subscriber sees them in that
//! same order.
//!
//! Two event streams are offered. [`AuthStore::subscribe`] is a bounded
//! broadcast for observers that can tolerate lagging. [`AuthStore::feed`]
//! never drops an event; consumers that must answer every request event
//! (the effect coordinator, a CLI waiting for an outcome) use it.

use crate::reducer::{reduce, AuthEvent, AuthState};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, trace};

const DEFAULT_EVENT_CAPACITY: usize = 64;

pub struct AuthStore {
    state: watch::Sender<AuthState>,
    events: broadcast::Sender<AuthEvent>,
    /// Lossless consumers. Holding this mutex also serializes `dispatch`.
    feeds: Mutex<Vec<mpsc::UnboundedSender<AuthEvent>>>,
}

impl AuthStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a store whose event channel buffers `capacity` events per
    /// subscriber before lagging.
    pub fn with_capacity(capacity: usize) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        let (events, _) = broadcast::channel(capacity);
        Self {
            state,
            events,
            feeds: Mutex::new(Vec::new()),
        }
    }

    /// Apply `event` and publish it to subscribers.
    pub fn dispatch(&self, event: AuthEvent) {
        let mut feeds = self.feeds.lock();
        debug!(event = event.name(), "Dispatching auth event");

        self.state.send_if_modified(|state| {
            let next = reduce(state, &event);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });

        feeds.retain(|feed| feed.send(event.clone()).is_ok());

        // No subscribers is fine
        if self.events.send(event).is_err() {
            trace!("No auth event subscribers");
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Receiver for every dispatched event, starting from the next one.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Unbounded receiver for every event dispatched after this call.
    ///
    /// Never lags. Dropping the receiver unregisters it on the next dispatch.
    pub fn feed(&self) -> mpsc::UnboundedReceiver<AuthEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.feeds.lock().push(sender);
        receiver
    }

    /// Wait until the state satisfies `predicate` and return it.
    pub async fn wait_for<F>(&self, predicate: F) -> AuthState
    where
        F: FnMut(&AuthState) -> bool,
    {
        let mut receiver = self.state.subscribe();
        let state = match receiver.wait_for(predicate).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so this cannot happen while we hold it
            Err(_) => self.state(),
        };
        state
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}
