//! 配置校验器注册表
//!
//! 注册表由管理器持有，并以共享句柄的形式注入每个状态；
//! 任意时刻追加的校验器对之后的校验调用可见。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::options::StateOptions;

/// When a validator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPhase {
    /// Once, during construction. Failure makes the state invalid.
    Once,
    /// Whenever the query starts matching. Failure vetoes the enter.
    Match,
    /// On every owner-driven resize. Failure skips the resize callbacks.
    Resize,
}

impl ValidationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Match => "match",
            Self::Resize => "resize",
        }
    }
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(Self::Once),
            "match" => Ok(Self::Match),
            "resize" => Ok(Self::Resize),
            other => Err(format!("unknown validation phase '{other}'")),
        }
    }
}

/// Read-only view of a state handed to validator predicates.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    pub id: &'a str,
    pub query: &'a str,
    pub options: &'a StateOptions,
    pub active: bool,
}

impl<'a> StateView<'a> {
    pub fn option(&self, name: &str) -> Option<&'a Value> {
        self.options.get(name)
    }
}

pub type ValidatorFn = Rc<dyn Fn(&StateView<'_>) -> bool>;

/// A named, phase-tagged predicate over a state's configuration.
///
/// The predicate only runs for states that define the option `name`.
#[derive(Clone)]
pub struct ConfigOption {
    name: String,
    when: ValidationPhase,
    test: ValidatorFn,
}

impl ConfigOption {
    pub fn new<F>(name: impl Into<String>, when: ValidationPhase, test: F) -> Self
    where
        F: Fn(&StateView<'_>) -> bool + 'static,
    {
        Self {
            name: name.into(),
            when,
            test: Rc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn when(&self) -> ValidationPhase {
        self.when
    }

    pub fn test(&self, view: &StateView<'_>) -> bool {
        (self.test)(view)
    }

    fn applies(&self, when: ValidationPhase, view: &StateView<'_>) -> bool {
        self.when == when && view.options.contains(&self.name)
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOption")
            .field("name", &self.name)
            .field("when", &self.when)
            .finish_non_exhaustive()
    }
}

/// Shared, append-only list of [`ConfigOption`]s. Clones share storage.
#[derive(Clone, Default)]
pub struct ConfigRegistry {
    options: Rc<RefCell<Vec<ConfigOption>>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, option: ConfigOption) {
        debug!(name = option.name(), when = %option.when(), "config option registered");
        self.options.borrow_mut().push(option);
    }

    pub fn len(&self) -> usize {
        self.options.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.borrow().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.options
            .borrow()
            .iter()
            .map(|o| o.name.clone())
            .collect()
    }

    /// Runs every validator registered for `when` whose option is defined
    /// on the state, in registration order. Stops at the first veto.
    pub fn test(&self, when: ValidationPhase, view: &StateView<'_>) -> bool {
        // snapshot so predicates may register further options
        let options: Vec<ConfigOption> = self.options.borrow().clone();
        for option in options.iter().filter(|o| o.applies(when, view)) {
            if !option.test(view) {
                debug!(
                    state_id = view.id,
                    validator = option.name(),
                    %when,
                    "config option vetoed"
                );
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.options.borrow().iter()).finish()
    }
}
