//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `mediastate_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, LoggingConfig, StateDefinition, ViewportConfig,
};
pub use crate::context::{IdGenerator, StateChangeNotifier, StateServices, TimestampIdGenerator};
pub use crate::error::{CliError, QueryError, StateError};
pub use crate::observer::{ChangeListener, MediaQueryObserver, SubscriptionHandle, ViewportEnvironment};
pub use crate::query::{MediaQuery, Orientation, Viewport};
pub use crate::state::{
    Callback, CallbackList, CallbackPhase, CallbackResult, ConfigOption, ConfigRegistry,
    ManagerSnapshot, MediaState, StateConfig, StateEvent, StateManager, StateSnapshot, StateView,
    Transition, ValidationPhase, DEFAULT_QUERY,
};
pub use crate::util::generate_state_id;
