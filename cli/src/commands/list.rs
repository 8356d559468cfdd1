use mediastate_core::api as core_api;

/// One line per configured state, in declaration order.
pub fn render_states(cfg: &core_api::AppConfig) -> Vec<String> {
    cfg.states
        .iter()
        .map(|def| {
            let id = def.id.as_deref().unwrap_or("(generated)");
            let query = def.query.as_deref().unwrap_or(core_api::DEFAULT_QUERY);
            if def.options.is_empty() {
                format!("{id}\t{query}")
            } else {
                let options: Vec<String> =
                    def.options.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{id}\t{query}\t{}", options.join(" "))
            }
        })
        .collect()
}

pub fn handle_list(cfg: &core_api::AppConfig) -> Result<i32, core_api::CliError> {
    if cfg.states.is_empty() {
        println!("No states configured.");
        return Ok(0);
    }
    for line in render_states(cfg) {
        println!("{line}");
    }
    Ok(0)
}
