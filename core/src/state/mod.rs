//! # 媒体状态模块
//!
//! 每个 [`MediaState`] 绑定一个媒体查询，在查询开始或停止匹配时
//! 运行进入/离开回调，在视口尺寸变化时运行 resize 回调。
//!
//! - 校验器（[`ConfigOption`]）可以在构造、匹配或 resize 时否决状态
//! - [`StateManager`] 持有多个状态，并通过广播通道发布 [`StateEvent`]
//! - 所有类型都是单线程的（`Rc`/`RefCell`），回调在调用线程上同步执行

pub mod manager;
pub mod media_state;
pub mod options;
pub mod snapshot;
pub mod transitions;
pub mod types;
pub mod validators;

pub use manager::StateManager;
pub use media_state::{MediaState, DEFAULT_QUERY};
pub use options::{
    Callback, CallbackList, CallbackPhase, CallbackResult, StateConfig, StateOptions,
    OPTION_ON_ENTER, OPTION_ON_FIRST_RUN, OPTION_ON_LEAVE, OPTION_ON_RESIZE,
};
pub use snapshot::ManagerSnapshot;
pub use transitions::Transition;
pub use types::{StateEvent, StateSnapshot};
pub use validators::{ConfigOption, ConfigRegistry, StateView, ValidationPhase, ValidatorFn};
