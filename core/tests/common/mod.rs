#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mediastate_core::api::{
    Callback, ChangeListener, MediaQueryObserver, StateError, SubscriptionHandle,
};

/// Observer test double: the test decides what matches and when edges are
/// delivered, and every call is recorded.
#[derive(Default)]
pub struct FakeObserver {
    matches: Cell<bool>,
    next_handle: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionHandle, String, ChangeListener)>>,
    subscribed: RefCell<Vec<String>>,
    unsubscribed: RefCell<Vec<SubscriptionHandle>>,
    queried: RefCell<Vec<String>>,
}

impl FakeObserver {
    pub fn new(matches: bool) -> Rc<Self> {
        let observer = Self::default();
        observer.matches.set(matches);
        Rc::new(observer)
    }

    pub fn set_matches(&self, matches: bool) {
        self.matches.set(matches);
    }

    /// Delivers `matches` to every live listener, like an observer edge.
    pub fn emit(&self, matches: bool) -> Result<(), StateError> {
        self.matches.set(matches);
        let listeners: Vec<ChangeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(matches)?;
        }
        Ok(())
    }

    pub fn subscribe_calls(&self) -> Vec<String> {
        self.subscribed.borrow().clone()
    }

    pub fn unsubscribe_calls(&self) -> Vec<SubscriptionHandle> {
        self.unsubscribed.borrow().clone()
    }

    pub fn query_calls(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl MediaQueryObserver for FakeObserver {
    fn currently_matches(&self, query: &str) -> bool {
        self.queried.borrow_mut().push(query.to_string());
        self.matches.get()
    }

    fn subscribe(&self, query: &str, on_change: ChangeListener) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new(self.next_handle.get());
        self.next_handle.set(self.next_handle.get() + 1);
        self.subscribed.borrow_mut().push(query.to_string());
        self.listeners
            .borrow_mut()
            .push((handle, query.to_string(), on_change));
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.unsubscribed.borrow_mut().push(handle);
        self.listeners.borrow_mut().retain(|(h, _, _)| *h != handle);
    }
}

/// Shared call counter.
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    pub fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn callback(&self) -> Callback {
        let count = self.0.clone();
        Callback::infallible(move || count.set(count.get() + 1))
    }
}

/// Records the order in which labelled callbacks ran.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self, label: &str) -> Callback {
        let log = self.0.clone();
        let label = label.to_string();
        Callback::infallible(move || log.borrow_mut().push(label.clone()))
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}
