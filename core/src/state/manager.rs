//! 状态管理器

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::media_state::MediaState;
use super::options::{Callback, CallbackPhase, StateConfig};
use super::snapshot::ManagerSnapshot;
use super::types::StateEvent;
use super::validators::{ConfigOption, ConfigRegistry};
use crate::context::{StateChangeNotifier, StateServices};
use crate::error::StateError;
use crate::observer::MediaQueryObserver;

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Owns a set of [`MediaState`]s that share one observer, validator
/// registry and change notifier.
///
/// States are kept in insertion order; the manager never orders or
/// schedules them against each other.
pub struct StateManager {
    services: StateServices,
    states: Vec<MediaState>,
    event_tx: broadcast::Sender<StateEvent>,
}

impl StateManager {
    /// 创建新的状态管理器
    pub fn new(observer: Rc<dyn MediaQueryObserver>) -> Self {
        Self::with_services(StateServices::new(observer))
    }

    /// Uses the given services; their notifier keeps being called and a
    /// [`StateEvent::StateChanged`] is broadcast after it.
    pub fn with_services(services: StateServices) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let hook: Rc<dyn StateChangeNotifier> = services.notifier.clone();
        let tx = event_tx.clone();
        let services = services.with_notifier(move || {
            hook.notify();
            let _ = tx.send(StateEvent::StateChanged {
                timestamp: Utc::now(),
            });
        });

        Self {
            services,
            states: Vec::new(),
            event_tx,
        }
    }

    pub fn services(&self) -> &StateServices {
        &self.services
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.services.registry
    }

    /// 订阅状态事件
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: StateEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Appends a validator to the registry shared by all states.
    pub fn add_config_option(&self, option: ConfigOption) {
        self.services.registry.register(option);
    }

    /// Builds and stores a state, returning its id.
    ///
    /// Unlike [`MediaState::new`], a `once` veto is reported as
    /// [`StateError::ConstructionRejected`] and the state is not kept.
    pub fn add_state(&mut self, config: StateConfig) -> Result<String, StateError> {
        if let Some(id) = config.id.as_deref() {
            if self.contains(id) {
                return Err(StateError::DuplicateId(id.to_string()));
            }
        }

        let state = MediaState::new(config, &self.services)?;

        if self.contains(state.id()) {
            let state_id = state.id().to_string();
            state.destroy();
            return Err(StateError::DuplicateId(state_id));
        }

        if !state.is_valid() {
            let state_id = state.id().to_string();
            warn!(state_id = %state_id, "state rejected, not added");
            self.emit_event(StateEvent::StateRejected {
                state_id: state_id.clone(),
                timestamp: Utc::now(),
            });
            return Err(StateError::ConstructionRejected { state_id });
        }

        let state_id = state.id().to_string();
        info!(
            state_id = %state_id,
            query = state.query(),
            active = state.is_active(),
            "state added"
        );
        self.emit_event(StateEvent::StateAdded {
            state_id: state_id.clone(),
            query: state.query().to_string(),
            active: state.is_active(),
            timestamp: Utc::now(),
        });
        self.states.push(state);
        Ok(state_id)
    }

    /// Adds states in order, stopping at the first failure.
    pub fn add_states<I>(&mut self, configs: I) -> Result<Vec<String>, StateError>
    where
        I: IntoIterator<Item = StateConfig>,
    {
        configs
            .into_iter()
            .map(|config| self.add_state(config))
            .collect()
    }

    /// Destroys and drops the state with this id.
    pub fn remove_state(&mut self, id: &str) -> bool {
        let Some(pos) = self.states.iter().position(|s| s.id() == id) else {
            return false;
        };
        let state = self.states.remove(pos);
        state.destroy();

        info!(state_id = %id, "state removed");
        self.emit_event(StateEvent::StateRemoved {
            state_id: id.to_string(),
            timestamp: Utc::now(),
        });
        true
    }

    pub fn remove_all(&mut self) -> usize {
        let ids: Vec<String> = self.states.iter().map(|s| s.id().to_string()).collect();
        ids.iter().filter(|id| self.remove_state(id)).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.states.iter().any(|s| s.id() == id)
    }

    pub fn get_state(&self, id: &str) -> Option<&MediaState> {
        self.states.iter().find(|s| s.id() == id)
    }

    pub fn get_states(&self) -> &[MediaState] {
        &self.states
    }

    pub fn active_states(&self) -> Vec<&MediaState> {
        self.states.iter().filter(|s| s.is_active()).collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn attach_callback(
        &self,
        id: &str,
        phase: CallbackPhase,
        callback: Callback,
        run_if_active: bool,
    ) -> Result<(), StateError> {
        self.get_state(id)
            .ok_or_else(|| StateError::NotFound(id.to_string()))?
            .attach_callback(phase, callback, run_if_active)
    }

    /// Forwards a viewport resize to every state, in insertion order.
    /// Returns how many states ran their resize callbacks.
    pub fn resize(&self) -> Result<usize, StateError> {
        let mut fired = 0;
        for state in &self.states {
            if state.resize_state()? {
                fired += 1;
            }
        }

        self.emit_event(StateEvent::Resized {
            state_count: self.states.len(),
            fired,
            timestamp: Utc::now(),
        });
        Ok(fired)
    }

    /// Whether `query` currently matches in the observed environment.
    pub fn matches(&self, query: &str) -> bool {
        self.services.observer.currently_matches(query)
    }

    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot::new(
            self.states.iter().map(MediaState::snapshot).collect(),
            self.services.registry.names(),
        )
    }
}

impl Drop for StateManager {
    fn drop(&mut self) {
        for state in self.states.drain(..) {
            state.destroy();
        }
    }
}

impl fmt::Debug for StateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("states", &self.states)
            .field("registry", &self.services.registry)
            .finish_non_exhaustive()
    }
}
