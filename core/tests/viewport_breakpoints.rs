mod common;

use std::rc::Rc;

use common::{CallLog, Counter};
use mediastate_core::api::{
    AppConfig, Callback, CallbackPhase, ConfigOption, StateConfig, StateError, StateEvent,
    StateManager, ValidationPhase, Viewport, ViewportEnvironment,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const CONFIG: &str = r#"
[viewport]
width = 480
height = 800

[[states]]
id = "mobile"
query = "(max-width: 767px)"

[[states]]
id = "tablet"
query = "(min-width: 768px) and (max-width: 991px)"

[[states]]
id = "desktop"
query = "(min-width: 992px)"

[[states]]
id = "legacy"
query = "(min-width: 1400px)"
enabled = false
"#;

fn breakpoints(log: &CallLog) -> (Rc<ViewportEnvironment>, StateManager) {
    let cfg: AppConfig = toml::from_str(CONFIG).unwrap();
    let env = Rc::new(ViewportEnvironment::new(cfg.viewport.into()));
    let mut manager = StateManager::new(env.clone());
    manager.add_config_option(ConfigOption::new("enabled", ValidationPhase::Once, |v| {
        v.option("enabled") != Some(&json!(false))
    }));

    for def in cfg.states {
        let id = def.id.clone().unwrap_or_default();
        let config = StateConfig::from(def)
            .on_enter(log.callback(&format!("enter:{id}")))
            .on_leave(log.callback(&format!("leave:{id}")));
        match manager.add_state(config) {
            Ok(_) | Err(StateError::ConstructionRejected { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    (env, manager)
}

fn active_ids(manager: &StateManager) -> Vec<String> {
    manager
        .active_states()
        .iter()
        .map(|s| s.id().to_string())
        .collect()
}

#[test]
fn breakpoints_follow_the_viewport() {
    let log = CallLog::new();
    let (env, manager) = breakpoints(&log);

    assert_eq!(manager.len(), 3);
    assert!(!manager.contains("legacy"));
    assert_eq!(active_ids(&manager), vec!["mobile"]);
    assert_eq!(log.entries(), vec!["enter:mobile"]);
    log.clear();

    assert_eq!(env.resize(820, 800).unwrap(), 2);
    assert_eq!(log.entries(), vec!["leave:mobile", "enter:tablet"]);
    assert_eq!(active_ids(&manager), vec!["tablet"]);
    log.clear();

    assert_eq!(env.resize(1280, 800).unwrap(), 2);
    assert_eq!(log.entries(), vec!["leave:tablet", "enter:desktop"]);
    log.clear();

    // inside the same breakpoint nothing fires
    assert_eq!(env.resize(1300, 900).unwrap(), 0);
    assert!(log.entries().is_empty());
    assert_eq!(active_ids(&manager), vec!["desktop"]);
}

#[test]
fn manager_resize_forwards_to_every_state() {
    let log = CallLog::new();
    let (_env, manager) = breakpoints(&log);
    let resized = Counter::new();

    for id in ["mobile", "tablet"] {
        manager
            .attach_callback(id, CallbackPhase::Resize, resized.callback(), false)
            .unwrap();
    }

    assert_eq!(manager.resize().unwrap(), 3);
    assert_eq!(resized.get(), 2);
}

#[test]
fn callback_fault_surfaces_from_viewport_change() {
    let env = Rc::new(ViewportEnvironment::new(Viewport::new(500, 800)));
    let mut manager = StateManager::new(env.clone());
    manager
        .add_state(
            StateConfig::new()
                .id("wide")
                .query("(min-width: 900px)")
                .on_enter(Callback::new(|| anyhow::bail!("layout failed"))),
        )
        .unwrap();

    let err = env.resize(1000, 800).unwrap_err();
    assert!(err.is_callback_fault());
    assert_eq!(err.state_id(), "wide");
    assert!(err.to_string().contains("layout failed"));
    assert!(!manager.get_state("wide").unwrap().is_active());
}

#[test]
fn callback_fault_does_not_block_other_states() {
    let env = Rc::new(ViewportEnvironment::new(Viewport::new(500, 800)));
    let mut manager = StateManager::new(env.clone());
    let entered = Counter::new();
    manager
        .add_state(
            StateConfig::new()
                .id("broken")
                .query("(min-width: 900px)")
                .on_enter(Callback::new(|| anyhow::bail!("layout failed"))),
        )
        .unwrap();
    manager
        .add_state(
            StateConfig::new()
                .id("tablet")
                .query("(min-width: 600px)")
                .on_enter(entered.callback()),
        )
        .unwrap();

    let err = env.resize(1000, 800).unwrap_err();
    assert_eq!(err.state_id(), "broken");
    assert!(manager.get_state("tablet").unwrap().is_active());
    assert_eq!(entered.get(), 1);

    // no stale edge is left behind for either state
    assert_eq!(env.resize(1010, 800).unwrap(), 0);
    assert_eq!(entered.get(), 1);
}

#[test]
fn events_are_broadcast_in_order() {
    let env = Rc::new(ViewportEnvironment::new(Viewport::new(500, 800)));
    let mut manager = StateManager::new(env.clone());
    let mut rx = manager.subscribe();

    manager
        .add_state(StateConfig::new().id("wide").query("(min-width: 900px)"))
        .unwrap();
    env.resize(1000, 800).unwrap();
    manager.resize().unwrap();
    assert!(manager.remove_state("wide"));

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(match event {
            StateEvent::StateAdded { .. } => "added",
            StateEvent::StateRejected { .. } => "rejected",
            StateEvent::StateRemoved { .. } => "removed",
            StateEvent::StateChanged { .. } => "changed",
            StateEvent::Resized { .. } => "resized",
        });
    }
    assert_eq!(kinds, vec!["added", "changed", "resized", "removed"]);
    assert_eq!(env.subscription_count(), 0);
}

#[test]
fn snapshot_serializes_current_states() {
    let log = CallLog::new();
    let (env, manager) = breakpoints(&log);
    env.resize(1024, 768).unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.active_ids(), vec!["desktop"]);
    assert_eq!(snapshot.validators, vec!["enabled".to_string()]);

    let json = snapshot.to_json().unwrap();
    assert!(json.contains("\"desktop\""));
    assert!(manager.matches("(orientation: landscape)"));
}
