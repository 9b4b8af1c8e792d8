use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use yew::Callback;

/// Observable single-value cell.
///
/// Subscribers receive the current value as soon as they subscribe and again
/// after every replacement. Clones share the same cell.
pub struct Store<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    value: RefCell<Rc<T>>,
    subscribers: RefCell<Vec<(u64, Callback<Rc<T>>)>>,
    next_id: Cell<u64>,
}

impl<T: 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(Rc::new(value)),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> Rc<T> {
        self.inner.value.borrow().clone()
    }

    /// Replaces the value and notifies every subscriber, even if it is unchanged.
    pub fn replace(&self, value: T) {
        let value = Rc::new(value);
        *self.inner.value.borrow_mut() = value.clone();

        // Subscribers may touch the store again, so emit from a snapshot.
        let subscribers: Vec<Callback<Rc<T>>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in subscribers {
            callback.emit(value.clone());
        }
    }

    /// Registers `callback` and immediately emits the current value to it.
    ///
    /// The callback stays registered until the returned `Subscription` is dropped.
    pub fn subscribe(&self, callback: Callback<Rc<T>>) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, callback.clone()));

        callback.emit(self.get());

        let inner: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: PartialEq + 'static> Store<T> {
    /// Sets the value, notifying subscribers only if it differs from the current one.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        if *self.get() == value {
            return false;
        }
        self.replace(value);
        true
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Store")
            .field(&self.inner.value.borrow())
            .finish()
    }
}

/// Keeps a store subscription alive; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}
