//! 状态配置：回调列表与附加选项

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StateDefinition;

/// Option names of the four callback lists. They are always present once
/// the configuration has been merged over the defaults.
pub const OPTION_ON_ENTER: &str = "on_enter";
pub const OPTION_ON_LEAVE: &str = "on_leave";
pub const OPTION_ON_RESIZE: &str = "on_resize";
pub const OPTION_ON_FIRST_RUN: &str = "on_first_run";

/// 回调执行结果
pub type CallbackResult = anyhow::Result<()>;

/// 零参数回调
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn() -> CallbackResult>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> CallbackResult + 'static,
    {
        Self(Rc::new(f))
    }

    /// Wraps a callback that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::new(move || {
            f();
            Ok(())
        })
    }

    pub fn call(&self) -> CallbackResult {
        (self.0)()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// A single callback or an ordered sequence of them, normalised to a list.
#[derive(Debug, Clone, Default)]
pub struct CallbackList(Vec<Callback>);

impl CallbackList {
    pub fn into_inner(self) -> Vec<Callback> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Callback> for CallbackList {
    fn from(cb: Callback) -> Self {
        Self(vec![cb])
    }
}

impl From<Vec<Callback>> for CallbackList {
    fn from(cbs: Vec<Callback>) -> Self {
        Self(cbs)
    }
}

impl FromIterator<Callback> for CallbackList {
    fn from_iter<I: IntoIterator<Item = Callback>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 回调阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPhase {
    Enter,
    Leave,
    Resize,
    FirstRun,
}

impl CallbackPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Leave => "leave",
            Self::Resize => "resize",
            Self::FirstRun => "first_run",
        }
    }

    pub fn option_name(self) -> &'static str {
        match self {
            Self::Enter => OPTION_ON_ENTER,
            Self::Leave => OPTION_ON_LEAVE,
            Self::Resize => OPTION_ON_RESIZE,
            Self::FirstRun => OPTION_ON_FIRST_RUN,
        }
    }
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(Self::Enter),
            "leave" => Ok(Self::Leave),
            "resize" => Ok(Self::Resize),
            "first_run" => Ok(Self::FirstRun),
            other => Err(format!("unknown callback phase '{other}'")),
        }
    }
}

/// Construction bundle for a [`MediaState`](super::MediaState).
///
/// `id` and `query` are lifted out before the rest is merged over the
/// defaults; an unset callback list stays empty.
#[derive(Debug, Clone, Default)]
pub struct StateConfig {
    pub id: Option<String>,
    pub query: Option<String>,
    pub on_enter: Option<CallbackList>,
    pub on_leave: Option<CallbackList>,
    pub on_resize: Option<CallbackList>,
    pub on_first_run: Option<CallbackList>,
    /// Extra named options, only consumed by validators.
    pub extra: BTreeMap<String, Value>,
}

impl StateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn on_enter(mut self, callbacks: impl Into<CallbackList>) -> Self {
        self.on_enter = Some(callbacks.into());
        self
    }

    pub fn on_leave(mut self, callbacks: impl Into<CallbackList>) -> Self {
        self.on_leave = Some(callbacks.into());
        self
    }

    pub fn on_resize(mut self, callbacks: impl Into<CallbackList>) -> Self {
        self.on_resize = Some(callbacks.into());
        self
    }

    pub fn on_first_run(mut self, callbacks: impl Into<CallbackList>) -> Self {
        self.on_first_run = Some(callbacks.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

impl From<StateDefinition> for StateConfig {
    fn from(def: StateDefinition) -> Self {
        Self {
            id: def.id,
            query: def.query,
            extra: def.options,
            ..Self::default()
        }
    }
}

/// Merged per-state options: the four callback lists plus extra values.
#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    pub(crate) on_enter: Vec<Callback>,
    pub(crate) on_leave: Vec<Callback>,
    pub(crate) on_resize: Vec<Callback>,
    pub(crate) on_first_run: Vec<Callback>,
    pub(crate) extra: BTreeMap<String, Value>,
}

impl StateOptions {
    /// Shallow merge of the caller's lists over the empty defaults.
    pub(crate) fn merge(
        on_enter: Option<CallbackList>,
        on_leave: Option<CallbackList>,
        on_resize: Option<CallbackList>,
        on_first_run: Option<CallbackList>,
        extra: BTreeMap<String, Value>,
    ) -> Self {
        let list = |l: Option<CallbackList>| l.map(CallbackList::into_inner).unwrap_or_default();
        Self {
            on_enter: list(on_enter),
            on_leave: list(on_leave),
            on_resize: list(on_resize),
            on_first_run: list(on_first_run),
            extra,
        }
    }

    /// Whether an option with this name is defined for the state.
    pub fn contains(&self, name: &str) -> bool {
        matches!(
            name,
            OPTION_ON_ENTER | OPTION_ON_LEAVE | OPTION_ON_RESIZE | OPTION_ON_FIRST_RUN
        ) || self.extra.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    pub fn callbacks(&self, phase: CallbackPhase) -> &[Callback] {
        match phase {
            CallbackPhase::Enter => &self.on_enter,
            CallbackPhase::Leave => &self.on_leave,
            CallbackPhase::Resize => &self.on_resize,
            CallbackPhase::FirstRun => &self.on_first_run,
        }
    }

    pub(crate) fn callbacks_mut(&mut self, phase: CallbackPhase) -> &mut Vec<Callback> {
        match phase {
            CallbackPhase::Enter => &mut self.on_enter,
            CallbackPhase::Leave => &mut self.on_leave,
            CallbackPhase::Resize => &mut self.on_resize,
            CallbackPhase::FirstRun => &mut self.on_first_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_callback_becomes_list() {
        let list: CallbackList = Callback::infallible(|| {}).into();
        assert_eq!(list.len(), 1);

        let list: CallbackList = vec![Callback::infallible(|| {}), Callback::infallible(|| {})].into();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_merge_keeps_defaults_for_unset_lists() {
        let cfg = StateConfig::new()
            .id("tablet")
            .on_enter(Callback::infallible(|| {}))
            .option("min_width", 768);

        let opts = StateOptions::merge(
            cfg.on_enter,
            cfg.on_leave,
            cfg.on_resize,
            cfg.on_first_run,
            cfg.extra,
        );
        assert_eq!(opts.callbacks(CallbackPhase::Enter).len(), 1);
        assert!(opts.callbacks(CallbackPhase::Leave).is_empty());
        assert!(opts.callbacks(CallbackPhase::FirstRun).is_empty());
        assert_eq!(opts.get("min_width"), Some(&json!(768)));
    }

    #[test]
    fn test_contains_callback_names_and_extras() {
        let opts = StateOptions::merge(None, None, None, None, BTreeMap::new());
        assert!(opts.contains(OPTION_ON_ENTER));
        assert!(opts.contains(OPTION_ON_FIRST_RUN));
        assert!(!opts.contains("min_width"));
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!("enter".parse::<CallbackPhase>(), Ok(CallbackPhase::Enter));
        assert_eq!("first_run".parse::<CallbackPhase>(), Ok(CallbackPhase::FirstRun));
        assert!("hover".parse::<CallbackPhase>().is_err());
        assert_eq!(CallbackPhase::Resize.option_name(), "on_resize");
    }

    #[test]
    fn test_callback_error_surfaces() {
        let cb = Callback::new(|| Err(anyhow::anyhow!("nope")));
        assert_eq!(cb.call().unwrap_err().to_string(), "nope");
    }
}
