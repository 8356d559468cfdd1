//! `mediastate simulate`: walk a virtual viewport through a list of widths.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mediastate_core::api as core_api;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::commands::cli::SimulateArgs;

/// Name of the built-in construction-time validator.
pub const ENABLED_OPTION: &str = "enabled";

/// `enabled = false` on a state keeps it from being created.
pub fn enabled_option() -> core_api::ConfigOption {
    core_api::ConfigOption::new(ENABLED_OPTION, core_api::ValidationPhase::Once, |view| {
        view.option(ENABLED_OPTION) != Some(&Value::Bool(false))
    })
}

/// A lifecycle callback that ran during the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredCallback {
    pub width: u32,
    pub state_id: String,
    pub phase: core_api::CallbackPhase,
}

/// Shared record of fired callbacks plus the width currently being applied.
#[derive(Clone, Default)]
pub struct FiredLog {
    width: Rc<Cell<u32>>,
    entries: Rc<RefCell<Vec<FiredCallback>>>,
}

impl FiredLog {
    fn callback(&self, state_id: &str, phase: core_api::CallbackPhase) -> core_api::Callback {
        let log = self.clone();
        let state_id = state_id.to_string();
        core_api::Callback::infallible(move || {
            tracing::debug!(state_id = %state_id, %phase, width = log.width.get(), "callback fired");
            log.entries.borrow_mut().push(FiredCallback {
                width: log.width.get(),
                state_id: state_id.clone(),
                phase,
            });
        })
    }

    pub fn entries(&self) -> Vec<FiredCallback> {
        self.entries.borrow().clone()
    }
}

pub struct Simulation {
    pub env: Rc<core_api::ViewportEnvironment>,
    pub manager: core_api::StateManager,
    pub log: FiredLog,
    /// IDs of configured states that validation refused.
    pub skipped: Vec<String>,
}

/// Builds the environment at the configured viewport and adds every
/// configured state with recording callbacks.
pub fn build(cfg: &core_api::AppConfig) -> Result<Simulation, core_api::CliError> {
    let viewport: core_api::Viewport = cfg.viewport.into();
    let env = Rc::new(core_api::ViewportEnvironment::new(viewport));
    let mut manager = core_api::StateManager::new(env.clone());
    manager.add_config_option(enabled_option());

    let log = FiredLog::default();
    log.width.set(viewport.width);

    let mut skipped = Vec::new();
    for def in &cfg.states {
        // ids are fixed up front so callbacks can name their state
        let state_id = def
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(core_api::generate_state_id);
        let config = core_api::StateConfig::from(def.clone())
            .id(state_id.as_str())
            .on_first_run(log.callback(&state_id, core_api::CallbackPhase::FirstRun))
            .on_enter(log.callback(&state_id, core_api::CallbackPhase::Enter))
            .on_leave(log.callback(&state_id, core_api::CallbackPhase::Leave))
            .on_resize(log.callback(&state_id, core_api::CallbackPhase::Resize));

        match manager.add_state(config) {
            Ok(_) => {}
            Err(core_api::StateError::ConstructionRejected { state_id }) => {
                tracing::warn!(state_id = %state_id, "state skipped");
                skipped.push(state_id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Simulation {
        env,
        manager,
        log,
        skipped,
    })
}

impl Simulation {
    /// Applies each width in turn, then forwards the resize to every state.
    pub fn run(&self, widths: &[u32], height: Option<u32>) -> Result<(), core_api::CliError> {
        for &width in widths {
            let height = height.unwrap_or_else(|| self.env.viewport().height);
            self.log.width.set(width);

            let notified = self.env.resize(width, height)?;
            let resized = self.manager.resize()?;
            tracing::info!(width, height, notified, resized, "viewport step");
        }
        Ok(())
    }
}

fn render_text(sim: &Simulation, snapshot: &core_api::ManagerSnapshot) -> String {
    let mut out = String::new();
    for id in &sim.skipped {
        out.push_str(&format!("skipped {id}\n"));
    }
    for fired in sim.log.entries() {
        out.push_str(&format!(
            "[{:>5}px] {:<9} {}\n",
            fired.width,
            fired.phase.as_str(),
            fired.state_id
        ));
    }
    let active = snapshot.active_ids();
    out.push_str(&format!(
        "active: {}\n",
        if active.is_empty() {
            "-".to_string()
        } else {
            active.join(", ")
        }
    ));
    out
}

fn render_json(
    sim: &Simulation,
    snapshot: &core_api::ManagerSnapshot,
) -> Result<String, core_api::CliError> {
    let fired: Vec<Value> = sim
        .log
        .entries()
        .into_iter()
        .map(|f| json!({ "width": f.width, "state_id": f.state_id, "phase": f.phase }))
        .collect();
    let report = json!({
        "skipped": sim.skipped,
        "fired": fired,
        "snapshot": serde_json::to_value(snapshot).map_err(anyhow::Error::from)?,
    });
    Ok(serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?)
}

/// Events seen by [`log_events`], plus those lost to lag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventTally {
    pub received: usize,
    pub missed: u64,
}

/// Logs manager events until the channel closes. Falling behind the
/// sender skips the overwritten events and keeps reading.
pub async fn log_events(mut event_rx: broadcast::Receiver<core_api::StateEvent>) -> EventTally {
    let mut tally = EventTally::default();
    loop {
        let event = match event_rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(missed = n, "event listener lagged");
                tally.missed += n;
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        tally.received += 1;
        match event {
            core_api::StateEvent::StateAdded {
                state_id, active, ..
            } => {
                tracing::debug!("State {} added (active={})", state_id, active);
            }
            core_api::StateEvent::StateChanged { .. } => {
                tracing::debug!("Breakpoint changed");
            }
            core_api::StateEvent::Resized {
                state_count, fired, ..
            } => {
                tracing::debug!("Resize fired {}/{} states", fired, state_count);
            }
            _ => {}
        }
    }
    tally
}

pub async fn handle_simulate(
    args: SimulateArgs,
    cfg: &core_api::AppConfig,
) -> Result<i32, core_api::CliError> {
    let sim = build(cfg)?;

    let listener = tokio::spawn(log_events(sim.manager.subscribe()));

    sim.run(&args.widths, args.height)?;

    let snapshot = sim.manager.snapshot();
    let output = if args.json {
        render_json(&sim, &snapshot)?
    } else {
        render_text(&sim, &snapshot)
    };
    print!("{output}");
    if args.json {
        println!();
    }

    // closes the event channel
    drop(sim);
    let _ = listener.await;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediastate_core::api::CallbackPhase::{Enter, FirstRun, Leave, Resize};

    const CONFIG: &str = r#"
[viewport]
width = 480
height = 800

[[states]]
id = "mobile"
query = "(max-width: 767px)"

[[states]]
id = "desktop"
query = "(min-width: 992px)"

[[states]]
id = "retired"
enabled = false
"#;

    fn config() -> core_api::AppConfig {
        toml::from_str(CONFIG).unwrap()
    }

    fn fired(width: u32, state_id: &str, phase: core_api::CallbackPhase) -> FiredCallback {
        FiredCallback {
            width,
            state_id: state_id.to_string(),
            phase,
        }
    }

    #[test]
    fn test_build_skips_disabled_states() {
        let sim = build(&config()).unwrap();
        assert_eq!(sim.manager.len(), 2);
        assert_eq!(sim.skipped, vec!["retired".to_string()]);
        assert_eq!(
            sim.log.entries(),
            vec![fired(480, "mobile", FirstRun), fired(480, "mobile", Enter)]
        );
    }

    #[test]
    fn test_run_records_transitions_per_width() {
        let sim = build(&config()).unwrap();
        sim.run(&[1280], None).unwrap();

        assert_eq!(
            sim.log.entries()[2..].to_vec(),
            vec![
                fired(1280, "mobile", Leave),
                fired(1280, "desktop", FirstRun),
                fired(1280, "desktop", Enter),
                fired(1280, "mobile", Resize),
                fired(1280, "desktop", Resize),
            ]
        );
        assert_eq!(sim.env.viewport().height, 800);
        assert_eq!(sim.manager.snapshot().active_ids(), vec!["desktop"]);
    }

    #[test]
    fn test_render_text_lists_active_states() {
        let sim = build(&config()).unwrap();
        let text = render_text(&sim, &sim.manager.snapshot());
        assert!(text.starts_with("skipped retired\n"));
        assert!(text.contains("enter"));
        assert!(text.ends_with("active: mobile\n"));
    }

    #[tokio::test]
    async fn test_log_events_survives_lag() {
        let sim = build(&config()).unwrap();
        let rx = sim.manager.subscribe();
        let bursts = 1500;
        for _ in 0..bursts {
            sim.manager.resize().unwrap();
        }
        drop(sim);

        let tally = log_events(rx).await;
        assert!(tally.missed > 0);
        assert!(tally.received > 0);
        assert_eq!(tally.received as u64 + tally.missed, bursts);
    }

    #[test]
    fn test_render_json_report() {
        let sim = build(&config()).unwrap();
        sim.run(&[900], Some(600)).unwrap();
        let report: Value =
            serde_json::from_str(&render_json(&sim, &sim.manager.snapshot()).unwrap()).unwrap();

        assert_eq!(report["skipped"], json!(["retired"]));
        assert_eq!(report["fired"][2]["phase"], json!("leave"));
        assert_eq!(report["snapshot"]["states"].as_array().unwrap().len(), 2);
    }
}
