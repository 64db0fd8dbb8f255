use clap::{Args, CommandFactory};
use eyre::Context;

use telemetry_logging::{Config, DriverRegistry};

use crate::commands::Telemetry;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cmd {}

impl Cmd {
    pub fn run(&self, config: &Config) -> eyre::Result<()> {
        let registry = DriverRegistry::with_builtin();
        let dispatcher = registry
            .initialize(config)
            .context("Configuration is invalid")?;

        let known = registry.kinds();
        let skipped: Vec<&str> = config
            .drivers
            .iter()
            .map(|spec| spec.kind.as_str())
            .filter(|kind| !known.contains(kind))
            .collect();

        println!(
            "Version:        {}",
            Telemetry::command().get_version().unwrap_or("")
        );
        println!("Threshold:      {}", dispatcher.threshold());
        println!("Drivers:        {}", dispatcher.driver_count());
        if !skipped.is_empty() {
            println!("Unknown types:  {}", skipped.join(", "));
        }
        println!("Available:      {}", known.join(", "));

        Ok(())
    }
}
