mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    sitestack::init_logging(cli.log_level.as_filter(), cli.log_format.into());
    tracing::debug!(command = ?cli.command, "sitestack started");

    match &cli.command {
        Command::Synth { site, out } => commands::synth(site, out),
        Command::Plan { site } => commands::plan(site),
        Command::Dependabot {
            config,
            maintainers,
            out,
        } => commands::dependabot(config.as_deref(), maintainers, out),
        Command::Validate { config_dir } => commands::validate(config_dir),
        Command::Init {
            config_dir,
            domain_name,
            maintainers,
        } => commands::init(config_dir, domain_name, maintainers),
    }
}
