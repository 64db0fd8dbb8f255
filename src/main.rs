mod commands;

use crate::commands::Telemetry;
use clap::Parser;
use std::process::ExitCode;
use yansi::Paint;

fn render_error(err: &eyre::Report) -> String {
    format!(
        "{}\n\n{}\n{}",
        format!("Error: {}", err).red(),
        "Caused by:".red(),
        format!("  {}", err.root_cause()).red()
    )
}

fn main() -> ExitCode {
    let telemetry = Telemetry::parse();

    match telemetry.run() {
        Err(err) => {
            eprintln!("{}", render_error(&err));
            ExitCode::from(1)
        }
        Ok(_) => ExitCode::from(0),
    }
}
