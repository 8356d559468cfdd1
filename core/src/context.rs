use std::rc::Rc;

use crate::observer::MediaQueryObserver;
use crate::state::ConfigRegistry;
use crate::util::generate_state_id;

/// Hook invoked once per observed enter/leave transition.
pub trait StateChangeNotifier {
    fn notify(&self);
}

impl<F: Fn()> StateChangeNotifier for F {
    fn notify(&self) {
        self()
    }
}

/// Source of ids for states created without one.
pub trait IdGenerator {
    fn make_id(&self) -> String;
}

impl<F: Fn() -> String> IdGenerator for F {
    fn make_id(&self) -> String {
        self()
    }
}

/// Default generator: `state-{YYYYMMDDHHmmss}-{random8}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIdGenerator;

impl IdGenerator for TimestampIdGenerator {
    fn make_id(&self) -> String {
        generate_state_id()
    }
}

/// Collaborators shared by every state of one owner.
#[derive(Clone)]
pub struct StateServices {
    pub observer: Rc<dyn MediaQueryObserver>,
    pub registry: ConfigRegistry,
    pub notifier: Rc<dyn StateChangeNotifier>,
    pub id_generator: Rc<dyn IdGenerator>,
}

impl StateServices {
    pub fn new(observer: Rc<dyn MediaQueryObserver>) -> Self {
        Self {
            observer,
            registry: ConfigRegistry::new(),
            notifier: Rc::new(|| {}),
            id_generator: Rc::new(TimestampIdGenerator),
        }
    }

    pub fn with_registry(self, registry: ConfigRegistry) -> Self {
        Self { registry, ..self }
    }

    pub fn with_notifier(self, notifier: impl StateChangeNotifier + 'static) -> Self {
        Self {
            notifier: Rc::new(notifier),
            ..self
        }
    }

    pub fn with_id_generator(self, id_generator: impl IdGenerator + 'static) -> Self {
        Self {
            id_generator: Rc::new(id_generator),
            ..self
        }
    }
}
