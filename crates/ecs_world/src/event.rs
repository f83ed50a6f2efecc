//! A minimal synchronous publish/subscribe primitive.
//!
//! [`Event::fire`] calls every connected callback in connection order before
//! returning. One-shot callbacks ([`Event::once`], [`Event::wait`]) are
//! disconnected right after the fire that delivered to them.

use std::fmt;
use std::sync::mpsc::{self, Receiver};

/// Handle returned by [`Event::connect`], used to disconnect the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection(u64);

type Callback<A> = Box<dyn FnMut(&A) + Send>;

struct Slot<A> {
    connection: Connection,
    once: bool,
    callback: Callback<A>,
}

/// A typed event with any number of connected callbacks.
pub struct Event<A> {
    slots: Vec<Slot<A>>,
    next_connection: u64,
}

impl<A> Event<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_connection: 0,
        }
    }

    fn push(&mut self, once: bool, callback: Callback<A>) -> Connection {
        let connection = Connection(self.next_connection);
        self.next_connection += 1;
        self.slots.push(Slot {
            connection,
            once,
            callback,
        });
        connection
    }

    /// Connect a callback, called on every fire until disconnected.
    pub fn connect<F>(&mut self, callback: F) -> Connection
    where
        F: FnMut(&A) + Send + 'static,
    {
        self.push(false, Box::new(callback))
    }

    /// Connect a callback that runs on the next fire only.
    pub fn once<F>(&mut self, callback: F) -> Connection
    where
        F: FnOnce(&A) + Send + 'static,
    {
        let mut callback = Some(callback);
        self.push(
            true,
            Box::new(move |args: &A| {
                if let Some(callback) = callback.take() {
                    callback(args);
                }
            }),
        )
    }

    /// Returns a receiver that gets a copy of the arguments of the next fire.
    pub fn wait(&mut self) -> Receiver<A>
    where
        A: Clone + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.once(move |args: &A| {
            // The waiter may have been dropped already; nothing to deliver to.
            let _ = tx.send(args.clone());
        });
        rx
    }

    /// Calls every connected callback in connection order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn fire(&mut self, args: &A) -> usize {
        for slot in &mut self.slots {
            (slot.callback)(args);
        }
        let fired = self.slots.len();
        self.slots.retain(|slot| !slot.once);
        fired
    }

    /// Disconnect one callback. Returns `false` if it was not connected.
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.connection != connection);
        self.slots.len() != before
    }

    pub fn disconnect_all(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn is_connected(&self, connection: Connection) -> bool {
        self.slots.iter().any(|slot| slot.connection == connection)
    }

    /// Number of connected callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<A> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("connections", &self.slots.len())
            .finish()
    }
}
