//! 媒体查询状态
//!
//! 单个断点状态的完整生命周期：构造与一次性校验、订阅媒体查询变化、
//! 以及 enter / leave / resize / first-run 回调的触发。

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use super::options::{Callback, CallbackPhase, StateConfig, StateOptions};
use super::transitions::Transition;
use super::types::StateSnapshot;
use super::validators::{ConfigRegistry, StateView, ValidationPhase};
use crate::context::{StateChangeNotifier, StateServices};
use crate::error::StateError;
use crate::observer::{ChangeListener, SubscriptionHandle};

/// Query used when the configuration does not name one.
pub const DEFAULT_QUERY: &str = "all";

/// A lifecycle bound to one media query.
///
/// Construct with [`MediaState::new`], check [`is_valid`](Self::is_valid),
/// and release with [`destroy`](Self::destroy).
pub struct MediaState {
    inner: Rc<MediaStateInner>,
    services: StateServices,
}

struct MediaStateInner {
    id: String,
    query: String,
    valid: bool,
    lifecycle: RefCell<Lifecycle>,
}

struct Lifecycle {
    options: StateOptions,
    active: bool,
    subscription: Option<SubscriptionHandle>,
}

/// Captured by the change listener. Must not hold the observer, which owns
/// the listener.
struct ListenerContext {
    registry: ConfigRegistry,
    notifier: Rc<dyn StateChangeNotifier>,
}

impl MediaStateInner {
    fn passes(&self, registry: &ConfigRegistry, when: ValidationPhase) -> bool {
        let lifecycle = self.lifecycle.borrow();
        registry.test(
            when,
            &StateView {
                id: &self.id,
                query: &self.query,
                options: &lifecycle.options,
                active: lifecycle.active,
            },
        )
    }

    fn is_active(&self) -> bool {
        self.lifecycle.borrow().active
    }

    /// Fires a list in insertion order. No borrow is held while callbacks
    /// run; the first failure aborts the rest of the list.
    fn fire(&self, phase: CallbackPhase) -> Result<usize, StateError> {
        let callbacks: Vec<Callback> = self.lifecycle.borrow().options.callbacks(phase).to_vec();
        for (index, callback) in callbacks.iter().enumerate() {
            callback.call().map_err(|source| StateError::Callback {
                state_id: self.id.clone(),
                phase,
                index,
                source,
            })?;
        }
        Ok(callbacks.len())
    }

    fn enter(&self) -> Result<(), StateError> {
        let first_run = self.fire(CallbackPhase::FirstRun)?;
        let on_enter = self.fire(CallbackPhase::Enter)?;

        let mut lifecycle = self.lifecycle.borrow_mut();
        lifecycle
            .options
            .callbacks_mut(CallbackPhase::FirstRun)
            .clear();
        lifecycle.active = true;

        debug!(
            state_id = %self.id,
            query = %self.query,
            first_run,
            on_enter,
            "state entered"
        );
        Ok(())
    }

    fn leave(&self) -> Result<(), StateError> {
        let on_leave = self.fire(CallbackPhase::Leave)?;
        self.lifecycle.borrow_mut().active = false;

        debug!(state_id = %self.id, query = %self.query, on_leave, "state left");
        Ok(())
    }

    fn handle_change(
        &self,
        ctx: &ListenerContext,
        matches: bool,
    ) -> Result<Transition, StateError> {
        if !self.valid {
            return Ok(Transition::Ignored);
        }

        let transition = if !matches {
            self.leave()?;
            Transition::Left
        } else if self.passes(&ctx.registry, ValidationPhase::Match) {
            self.enter()?;
            Transition::Entered
        } else {
            Transition::Vetoed
        };

        debug!(
            state_id = %self.id,
            matches,
            transition = transition.description(),
            "media query change handled"
        );

        if transition.is_change() {
            ctx.notifier.notify();
        }
        Ok(transition)
    }
}

impl MediaState {
    /// Builds, validates and (when valid) initialises a state.
    ///
    /// A `once` validator veto is not an error: the returned state has
    /// `is_valid() == false`, never subscribes and never fires. `Err` only
    /// comes from a callback failing during the initial enter, in which case
    /// no subscription was made.
    pub fn new(config: StateConfig, services: &StateServices) -> Result<Self, StateError> {
        let StateConfig {
            id,
            query,
            on_enter,
            on_leave,
            on_resize,
            on_first_run,
            extra,
        } = config;

        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| services.id_generator.make_id());
        let query = query
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());
        let options = StateOptions::merge(on_enter, on_leave, on_resize, on_first_run, extra);

        let valid = services.registry.test(
            ValidationPhase::Once,
            &StateView {
                id: &id,
                query: &query,
                options: &options,
                active: false,
            },
        );

        let state = Self {
            inner: Rc::new(MediaStateInner {
                id,
                query,
                valid,
                lifecycle: RefCell::new(Lifecycle {
                    options,
                    active: false,
                    subscription: None,
                }),
            }),
            services: services.clone(),
        };

        if !valid {
            warn!(
                state_id = %state.inner.id,
                "state rejected by once-phase config options"
            );
            return Ok(state);
        }

        state.init()?;
        Ok(state)
    }

    fn init(&self) -> Result<(), StateError> {
        let observer = &self.services.observer;
        if observer.currently_matches(&self.inner.query)
            && self
                .inner
                .passes(&self.services.registry, ValidationPhase::Match)
        {
            self.inner.enter()?;
        }

        let ctx = self.listener_context();
        let weak: Weak<MediaStateInner> = Rc::downgrade(&self.inner);
        let listener: ChangeListener = Rc::new(move |matches: bool| match weak.upgrade() {
            Some(inner) => inner.handle_change(&ctx, matches).map(|_| ()),
            None => Ok(()),
        });

        let handle = observer.subscribe(&self.inner.query, listener);
        self.inner.lifecycle.borrow_mut().subscription = Some(handle);

        debug!(
            state_id = %self.inner.id,
            query = %self.inner.query,
            %handle,
            active = self.inner.is_active(),
            "state initialised"
        );
        Ok(())
    }

    fn listener_context(&self) -> ListenerContext {
        ListenerContext {
            registry: self.services.registry.clone(),
            notifier: self.services.notifier.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn query(&self) -> &str {
        &self.inner.query
    }

    pub fn is_valid(&self) -> bool {
        self.inner.valid
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.inner.lifecycle.borrow().subscription
    }

    pub fn callback_count(&self, phase: CallbackPhase) -> usize {
        self.inner
            .lifecycle
            .borrow()
            .options
            .callbacks(phase)
            .len()
    }

    pub fn option(&self, name: &str) -> Option<Value> {
        self.inner.lifecycle.borrow().options.get(name).cloned()
    }

    /// Runs the shared validators registered for `when` against this state.
    pub fn test_config_options(&self, when: ValidationPhase) -> bool {
        self.inner.passes(&self.services.registry, when)
    }

    /// Processes a match-value edge exactly as the subscription listener
    /// does. Useful for owners that receive notifications themselves.
    pub fn handle_change(&self, matches: bool) -> Result<Transition, StateError> {
        self.inner.handle_change(&self.listener_context(), matches)
    }

    /// Fires first-run (once) and enter callbacks, then marks the state active.
    pub fn enter_state(&self) -> Result<(), StateError> {
        if !self.inner.valid {
            debug!(state_id = %self.inner.id, "enter on invalid state ignored");
            return Ok(());
        }
        self.inner.enter()
    }

    /// Fires leave callbacks, then marks the state inactive.
    pub fn leave_state(&self) -> Result<(), StateError> {
        if !self.inner.valid {
            debug!(state_id = %self.inner.id, "leave on invalid state ignored");
            return Ok(());
        }
        self.inner.leave()
    }

    /// Owner-driven resize. Fires the resize callbacks when every `resize`
    /// validator passes; returns whether they ran. Never changes `active`.
    pub fn resize_state(&self) -> Result<bool, StateError> {
        if !self.inner.valid {
            debug!(state_id = %self.inner.id, "resize on invalid state ignored");
            return Ok(false);
        }
        if !self.test_config_options(ValidationPhase::Resize) {
            return Ok(false);
        }
        self.inner.fire(CallbackPhase::Resize)?;
        Ok(true)
    }

    /// Appends `callback` to the enter, leave or resize list.
    ///
    /// With `run_if_active` an enter callback attached to an active state is
    /// also invoked right away; it still fires on later enters. First-run
    /// callbacks can only be supplied at construction and are ignored here.
    pub fn attach_callback(
        &self,
        phase: CallbackPhase,
        callback: Callback,
        run_if_active: bool,
    ) -> Result<(), StateError> {
        if phase == CallbackPhase::FirstRun {
            debug!(state_id = %self.inner.id, "first_run callbacks cannot be attached");
            return Ok(());
        }

        let index = {
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            let list = lifecycle.options.callbacks_mut(phase);
            list.push(callback.clone());
            list.len() - 1
        };

        if phase == CallbackPhase::Enter && run_if_active && self.is_active() {
            callback.call().map_err(|source| StateError::Callback {
                state_id: self.inner.id.clone(),
                phase,
                index,
                source,
            })?;
        }
        Ok(())
    }

    /// [`attach_callback`](Self::attach_callback) keyed by phase name.
    /// Unknown names are ignored.
    pub fn attach_callback_named(
        &self,
        phase: &str,
        callback: Callback,
        run_if_active: bool,
    ) -> Result<(), StateError> {
        match phase.parse::<CallbackPhase>() {
            Ok(phase) => self.attach_callback(phase, callback, run_if_active),
            Err(e) => {
                debug!(state_id = %self.inner.id, "{e}; callback ignored");
                Ok(())
            }
        }
    }

    /// Unsubscribes from the observer. Consumes the state; dropping it has
    /// the same effect.
    pub fn destroy(self) {
        let handle = self.release();
        debug!(state_id = %self.inner.id, ?handle, "state destroyed");
    }

    fn release(&self) -> Option<SubscriptionHandle> {
        let handle = self.inner.lifecycle.borrow_mut().subscription.take();
        if let Some(handle) = handle {
            self.services.observer.unsubscribe(handle);
        }
        handle
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let lifecycle = self.inner.lifecycle.borrow();
        let count = |phase| lifecycle.options.callbacks(phase).len();
        StateSnapshot {
            id: self.inner.id.clone(),
            query: self.inner.query.clone(),
            valid: self.inner.valid,
            active: lifecycle.active,
            on_enter: count(CallbackPhase::Enter),
            on_leave: count(CallbackPhase::Leave),
            on_resize: count(CallbackPhase::Resize),
            first_run_pending: count(CallbackPhase::FirstRun),
            options: lifecycle.options.extra().clone(),
        }
    }
}

impl Drop for MediaState {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for MediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaState")
            .field("id", &self.inner.id)
            .field("query", &self.inner.query)
            .field("valid", &self.inner.valid)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ViewportEnvironment;
    use crate::query::Viewport;
    use crate::state::ConfigOption;
    use std::cell::Cell;

    fn env(width: u32) -> Rc<ViewportEnvironment> {
        Rc::new(ViewportEnvironment::new(Viewport::new(width, 800)))
    }

    #[test]
    fn test_defaults_to_all_and_enters_immediately() {
        let env = env(1024);
        let services = StateServices::new(env.clone());
        let state = MediaState::new(StateConfig::new().id("any"), &services).unwrap();

        assert_eq!(state.query(), DEFAULT_QUERY);
        assert!(state.is_valid());
        assert!(state.is_active());
        assert_eq!(env.subscription_count(), 1);
    }

    #[test]
    fn test_generated_id_when_missing() {
        let services =
            StateServices::new(env(1024)).with_id_generator(|| "generated-1".to_string());
        let state = MediaState::new(StateConfig::new().id(""), &services).unwrap();
        assert_eq!(state.id(), "generated-1");
    }

    #[test]
    fn test_invalid_state_is_inert() {
        let env = env(1024);
        let services = StateServices::new(env.clone());
        services.registry.register(ConfigOption::new(
            "enabled",
            ValidationPhase::Once,
            |v| v.option("enabled") == Some(&Value::Bool(true)),
        ));
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let state = MediaState::new(
            StateConfig::new()
                .option("enabled", false)
                .on_enter(Callback::infallible(move || counter.set(counter.get() + 1))),
            &services,
        )
        .unwrap();

        assert!(!state.is_valid());
        assert!(!state.is_active());
        assert_eq!(state.subscription(), None);
        assert_eq!(env.subscription_count(), 0);
        assert_eq!(state.handle_change(true).unwrap(), Transition::Ignored);
        assert!(!state.resize_state().unwrap());
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn test_destroy_unsubscribes() {
        let env = env(1024);
        let services = StateServices::new(env.clone());
        let state = MediaState::new(StateConfig::new().query("(min-width: 800px)"), &services)
            .unwrap();
        assert_eq!(env.subscription_count(), 1);

        state.destroy();
        assert_eq!(env.subscription_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let env = env(1024);
        let services = StateServices::new(env.clone());
        {
            let _state = MediaState::new(StateConfig::new(), &services).unwrap();
            assert_eq!(env.subscription_count(), 1);
        }
        assert_eq!(env.subscription_count(), 0);
    }

    #[test]
    fn test_callbacks_may_reenter_state() {
        let services = StateServices::new(env(1024));
        let state = Rc::new(MediaState::new(StateConfig::new().id("reentrant"), &services).unwrap());

        let weak = Rc::downgrade(&state);
        state
            .attach_callback(
                CallbackPhase::Resize,
                Callback::new(move || {
                    if let Some(state) = weak.upgrade() {
                        state.attach_callback(
                            CallbackPhase::Leave,
                            Callback::infallible(|| {}),
                            false,
                        )?;
                    }
                    Ok(())
                }),
                false,
            )
            .unwrap();

        assert!(state.resize_state().unwrap());
        assert_eq!(state.callback_count(CallbackPhase::Leave), 1);
    }

    #[test]
    fn test_first_run_failure_keeps_state_inactive() {
        let services = StateServices::new(env(1024));
        let result = MediaState::new(
            StateConfig::new()
                .id("broken")
                .on_first_run(Callback::new(|| Err(anyhow::anyhow!("boom")))),
            &services,
        );

        match result {
            Err(StateError::Callback { phase, index, .. }) => {
                assert_eq!(phase, CallbackPhase::FirstRun);
                assert_eq!(index, 0);
            }
            other => panic!("expected callback fault, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_counts() {
        let services = StateServices::new(env(500));
        let state = MediaState::new(
            StateConfig::new()
                .id("wide")
                .query("(min-width: 800px)")
                .on_enter(vec![Callback::infallible(|| {}), Callback::infallible(|| {})])
                .on_first_run(Callback::infallible(|| {}))
                .option("label", "Wide"),
            &services,
        )
        .unwrap();

        let snap = state.snapshot();
        assert_eq!(snap.id, "wide");
        assert!(!snap.active);
        assert_eq!(snap.on_enter, 2);
        assert_eq!(snap.first_run_pending, 1);
        assert_eq!(snap.options.get("label"), Some(&Value::from("Wide")));
    }
}
