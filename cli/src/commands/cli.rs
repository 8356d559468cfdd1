use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "mediastate",
    version,
    about = "Drive media-query breakpoint states against a virtual viewport"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file. Defaults to $MEDIASTATE_CONFIG, then ./mediastate.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize the viewport through a list of widths and report fired callbacks
    Simulate(SimulateArgs),
    /// Evaluate one media query at a given viewport size
    Check(CheckArgs),
    /// Print the configured states
    List,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SimulateArgs {
    /// Comma-separated viewport widths in px, applied in order.
    #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
    pub widths: Vec<u32>,

    /// Viewport height for every step. Defaults to the configured height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub query: String,

    #[arg(long)]
    pub width: u32,

    /// Defaults to the configured height.
    #[arg(long)]
    pub height: Option<u32>,
}
