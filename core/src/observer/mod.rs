//! The media-query change-notification capability that states subscribe to.

mod environment;

pub use environment::ViewportEnvironment;

use std::fmt;
use std::rc::Rc;

use crate::error::StateError;

/// Listener invoked with the new `matches` value on every edge.
///
/// Errors returned by the listener (callback faults) propagate to whoever
/// delivered the notification.
pub type ChangeListener = Rc<dyn Fn(bool) -> Result<(), StateError>>;

/// Opaque registration returned by [`MediaQueryObserver::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Host environment media-query facility (e.g. `window.matchMedia`).
///
/// Delivery must be edge-triggered: `on_change` fires once per transition of
/// the query's match value, never per poll.
pub trait MediaQueryObserver {
    fn currently_matches(&self, query: &str) -> bool;

    fn subscribe(&self, query: &str, on_change: ChangeListener) -> SubscriptionHandle;

    fn unsubscribe(&self, handle: SubscriptionHandle);
}
