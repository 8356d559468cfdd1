use std::cell::RefCell;

use tracing::{debug, warn};

use super::{ChangeListener, MediaQueryObserver, SubscriptionHandle};
use crate::error::StateError;
use crate::query::{MediaQuery, Viewport};

/// In-process [`MediaQueryObserver`] backed by a virtual viewport.
///
/// Change notifications are delivered synchronously from
/// [`ViewportEnvironment::set_viewport`], only for subscriptions whose match
/// value actually flipped.
pub struct ViewportEnvironment {
    inner: RefCell<EnvironmentInner>,
}

struct EnvironmentInner {
    viewport: Viewport,
    next_handle: u64,
    subscriptions: Vec<Subscription>,
}

struct Subscription {
    handle: SubscriptionHandle,
    query: Option<MediaQuery>,
    matches: bool,
    listener: ChangeListener,
}

impl ViewportEnvironment {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            inner: RefCell::new(EnvironmentInner {
                viewport,
                next_handle: 1,
                subscriptions: Vec::new(),
            }),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Moves the viewport and notifies every subscription whose query
    /// changed its match value, in subscription order.
    ///
    /// Returns how many notifications were delivered. All stored match values
    /// are updated before the first listener runs. A failing listener does
    /// not stop delivery to the others; the first error is returned once
    /// every listener has run.
    pub fn set_viewport(&self, viewport: Viewport) -> Result<usize, StateError> {
        let pending: Vec<(SubscriptionHandle, ChangeListener, bool)> = {
            let mut inner = self.inner.borrow_mut();
            inner.viewport = viewport;
            inner
                .subscriptions
                .iter_mut()
                .filter_map(|sub| {
                    let now = sub
                        .query
                        .as_ref()
                        .map(|q| q.matches(&viewport))
                        .unwrap_or(false);
                    if now == sub.matches {
                        return None;
                    }
                    sub.matches = now;
                    Some((sub.handle, sub.listener.clone(), now))
                })
                .collect()
        };

        debug!(
            width = viewport.width,
            height = viewport.height,
            notifications = pending.len(),
            "viewport changed"
        );

        let mut first_err = None;
        for (handle, listener, matches) in &pending {
            debug!(%handle, matches, "delivering media query change");
            if let Err(e) = listener(*matches) {
                warn!(%handle, error = %e, "media query listener failed");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(pending.len()),
        }
    }

    /// Convenience for [`set_viewport`](Self::set_viewport) with a new size.
    pub fn resize(&self, width: u32, height: u32) -> Result<usize, StateError> {
        self.set_viewport(Viewport::new(width, height))
    }
}

impl Default for ViewportEnvironment {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

fn parse_or_warn(query: &str) -> Option<MediaQuery> {
    match MediaQuery::parse(query) {
        Ok(q) => Some(q),
        Err(e) => {
            warn!(query, error = %e, "unparseable media query never matches");
            None
        }
    }
}

impl MediaQueryObserver for ViewportEnvironment {
    fn currently_matches(&self, query: &str) -> bool {
        let viewport = self.viewport();
        parse_or_warn(query)
            .map(|q| q.matches(&viewport))
            .unwrap_or(false)
    }

    fn subscribe(&self, query: &str, on_change: ChangeListener) -> SubscriptionHandle {
        let parsed = parse_or_warn(query);
        let mut inner = self.inner.borrow_mut();
        let matches = parsed
            .as_ref()
            .map(|q| q.matches(&inner.viewport))
            .unwrap_or(false);
        let handle = SubscriptionHandle::new(inner.next_handle);
        inner.next_handle += 1;
        inner.subscriptions.push(Subscription {
            handle,
            query: parsed,
            matches,
            listener: on_change,
        });
        debug!(%handle, query, matches, "media query subscribed");
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscriptions.len();
        inner.subscriptions.retain(|s| s.handle != handle);
        if inner.subscriptions.len() == before {
            warn!(%handle, "unsubscribe for unknown subscription");
        } else {
            debug!(%handle, "media query unsubscribed");
        }
    }
}
