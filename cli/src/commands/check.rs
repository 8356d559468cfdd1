use mediastate_core::api as core_api;

use crate::commands::cli::CheckArgs;

/// Exit code when the query is valid but does not match.
pub const NO_MATCH_EXIT: i32 = 1;

pub fn handle_check(args: &CheckArgs, cfg: &core_api::AppConfig) -> Result<i32, core_api::CliError> {
    let query = core_api::MediaQuery::parse(&args.query)?;
    let viewport = core_api::Viewport::new(args.width, args.height.unwrap_or(cfg.viewport.height));
    let matched = query.matches(&viewport);

    tracing::debug!(query = %query, width = viewport.width, height = viewport.height, matched, "query checked");
    println!(
        "{} {} at {}x{}",
        query,
        if matched { "matches" } else { "does not match" },
        viewport.width,
        viewport.height
    );

    Ok(if matched { 0 } else { NO_MATCH_EXIT })
}
