//! A tiny typed pub/sub primitive used throughout the engine.
//!
//! The call engine exposes four independent observation streams
//! (`callStateChanged`, `callEventChanged`, `callError`, `callInfoChanged`).
//! Rather than reach for a channel or an external event-bus crate, each
//! stream is backed by one [`EventEmitter<T>`]: a handler registry that
//! dispatches synchronously, in subscription order, on the calling task.
//! No re-entrancy guard is needed because the engine's cooperative,
//! single-threaded scheduling model (see the crate's design notes) already
//! guarantees emissions never overlap.
//!
//! # Examples
//!
//! ```
//! use callkit_rs::event_emitter::EventEmitter;
//!
//! let mut emitter: EventEmitter<u32> = EventEmitter::new();
//! emitter.subscribe(|n| println!("got {n}"));
//! emitter.emit(&42);
//! ```

/// A handler invoked synchronously whenever the owning [`EventEmitter`] emits.
pub type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Typed, synchronous, FIFO pub/sub channel.
///
/// Subscribers are called in the order they registered. `emit` never
/// suspends: every handler runs to completion before the next one starts,
/// and before `emit` returns.
pub struct EventEmitter<T> {
    handlers: Vec<Handler<T>>,
}

impl<T> EventEmitter<T> {
    /// Creates an emitter with no subscribers.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registers a handler, returning its subscription index.
    ///
    /// The index can be passed to [`EventEmitter::unsubscribe`] to remove the
    /// handler later; indices are stable until the handler at that index is
    /// removed.
    pub fn subscribe<F>(&mut self, handler: F) -> usize
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
        self.handlers.len() - 1
    }

    /// Removes the handler previously returned by `subscribe`, if still present.
    pub fn unsubscribe(&mut self, index: usize) {
        if index < self.handlers.len() {
            // Leave a no-op in place so earlier indices stay valid.
            self.handlers[index] = Box::new(|_| {});
        }
    }

    /// Dispatches `event` to every subscriber, in registration order.
    pub fn emit(&self, event: &T) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    /// Number of currently registered handlers (including unsubscribed slots).
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn emits_in_subscription_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut emitter: EventEmitter<()> = EventEmitter::new();

        let o1 = order.clone();
        emitter.subscribe(move |_| o1.lock().unwrap().push(1));
        let o2 = order.clone();
        emitter.subscribe(move |_| o2.lock().unwrap().push(2));

        emitter.emit(&());
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribed_handler_is_not_called() {
        let count = Arc::new(AtomicU32::new(0));
        let mut emitter: EventEmitter<()> = EventEmitter::new();

        let c = count.clone();
        let id = emitter.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        emitter.unsubscribe(id);
        emitter.emit(&());

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_subscribers_is_a_no_op() {
        let emitter: EventEmitter<&str> = EventEmitter::new();
        emitter.emit(&"hello");
        assert!(emitter.is_empty());
    }
}
