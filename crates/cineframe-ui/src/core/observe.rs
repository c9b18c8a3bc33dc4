//! Change-notification registry for single-threaded UI state.
//!
//! # Design
//! - Callbacks run after the owner has released its own borrows, so a callback may read
//!   the state that changed.
//! - A [`Subscription`] unregisters its callback when dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

/// Set of change callbacks owned by one piece of state.
#[derive(Clone, Default)]
pub struct Listeners {
    table: Rc<RefCell<ListenerTable>>,
}

impl Listeners {
    /// Register `callback`; it stays registered while the returned handle lives.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        let mut table = self.table.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push((id, Rc::new(callback)));
        Subscription {
            table: Rc::downgrade(&self.table),
            id,
        }
    }

    /// Invoke every registered callback.
    pub fn notify(&self) {
        let callbacks: Vec<Callback> = self
            .table
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.borrow().entries.len()
    }

    /// Whether nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

/// Registration handle returned by [`Listeners::subscribe`].
#[must_use = "dropping a subscription unregisters its callback"]
#[derive(Debug)]
pub struct Subscription {
    table: Weak<RefCell<ListenerTable>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dropped_subscription_stops_notifications() {
        let listeners = Listeners::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = listeners.subscribe(move || counter.set(counter.get() + 1));

        listeners.notify();
        assert_eq!(hits.get(), 1);

        drop(subscription);
        listeners.notify();
        assert_eq!(hits.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn callbacks_may_subscribe_during_notify() {
        let listeners = Listeners::default();
        let inner = listeners.clone();
        let held = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&held);
        let _outer = listeners.subscribe(move || sink.borrow_mut().push(inner.subscribe(|| {})));
        listeners.notify();
        assert_eq!(listeners.len(), 2);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let listeners = Listeners::default();
        let subscription = listeners.subscribe(|| {});
        drop(listeners);
        drop(subscription);
    }
}
