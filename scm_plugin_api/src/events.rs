//! Observer primitives used for provider change notifications.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crossbeam_channel::{Receiver, Sender};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
    channels: Vec<Sender<T>>,
    closed: bool,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
            channels: Vec::new(),
            closed: false,
        }
    }
}

type Shared<T> = Arc<Mutex<Listeners<T>>>;

fn lock<T>(shared: &Mutex<Listeners<T>>) -> MutexGuard<'_, Listeners<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner side of an event stream. Only the owner can fire or close it.
pub struct Emitter<T> {
    listeners: Shared<T>,
}

impl<T: 'static> Emitter<T> {
    /// Create an open emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Subscribe-only view of this stream.
    #[must_use]
    pub fn event(&self) -> Event<T> {
        Event {
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Drop every listener and refuse new ones. Channel receivers see a
    /// disconnect once they have drained what was already sent.
    pub fn close(&self) {
        let mut listeners = lock(&self.listeners);
        listeners.closed = true;
        listeners.entries.clear();
        listeners.channels.clear();
    }

    /// Whether [`Emitter::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.listeners).closed
    }

    /// Number of live listeners, channel subscribers included.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let listeners = lock(&self.listeners);
        listeners.entries.len() + listeners.channels.len()
    }
}

impl<T: Clone + 'static> Emitter<T> {
    /// Deliver `event` to every current subscriber and return how many were reached.
    ///
    /// Callbacks run outside the internal lock, so they may subscribe or
    /// unsubscribe while being notified. Channel subscribers whose receiver
    /// is gone are pruned here.
    pub fn fire(&self, event: &T) -> usize {
        let (snapshot, sent) = {
            let mut listeners = lock(&self.listeners);
            if listeners.closed {
                return 0;
            }
            listeners
                .channels
                .retain(|tx| tx.send(event.clone()).is_ok());
            let snapshot: Vec<Listener<T>> = listeners
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            (snapshot, listeners.channels.len())
        };
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len() + sent
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = lock(&self.listeners);
        f.debug_struct("Emitter")
            .field("listeners", &listeners.entries.len())
            .field("channels", &listeners.channels.len())
            .field("closed", &listeners.closed)
            .finish()
    }
}

/// Subscribe-only handle to an [`Emitter`].
pub struct Event<T> {
    listeners: Shared<T>,
}

impl<T: Send + 'static> Event<T> {
    /// Register `listener`. It stays registered until the returned
    /// [`Subscription`] is dropped or disposed.
    ///
    /// Subscribing to a closed stream yields an inert subscription.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        if listeners.closed {
            return Subscription::inert();
        }
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    lock(&shared).entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Subscribe through an unbounded channel instead of a callback.
    ///
    /// The subscription ends when the receiver is dropped. On a closed
    /// stream the receiver is already disconnected.
    #[must_use]
    pub fn receiver(&self) -> Receiver<T> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut listeners = lock(&self.listeners);
        if !listeners.closed {
            listeners.channels.push(tx);
        }
        rx
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").finish_non_exhaustive()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn inert() -> Self {
        Self { unsubscribe: None }
    }

    /// Unsubscribe now.
    pub fn dispose(mut self) {
        self.release();
    }

    /// Whether this subscription still holds a listener slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
