use std::{fmt::Display, path::PathBuf};

use clap::{Parser, Subcommand};
use eyre::{Context, OptionExt};
use tracing_subscriber::filter::LevelFilter;

use telemetry_logging::{config::default_config_path, Config};

mod check;
mod emit;

#[derive(Subcommand, Debug)]
pub enum TelemetryCmd {
    Emit(emit::Cmd),

    Check(check::Cmd),
}

impl Display for TelemetryCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryCmd::Emit(cmd) => write!(f, "emit {}", cmd.level),
            TelemetryCmd::Check(_cmd) => write!(f, "check"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, long_version = "")]
#[command(about = "Send structured log events through the configured drivers.", long_about = None, disable_help_subcommand = true)]
pub struct Telemetry {
    #[arg(
        global = true,
        long,
        short = 'c',
        help = "Path to the logger configuration (JSON or TOML). Defaults to $TELEMETRY_CONFIG or $XDG_CONFIG_HOME/telemetry/config.json.",
        display_order = 0
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = "Write diagnostic messages to stderr.",
        display_order = 999
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: TelemetryCmd,
}

impl Telemetry {
    fn log_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            5..=u8::MAX => LevelFilter::TRACE,
        }
    }

    fn setup_diagnostics(&self) -> eyre::Result<()> {
        if self.verbose == 0 {
            return Ok(());
        }

        tracing_subscriber::fmt()
            .with_max_level(self.log_filter())
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| eyre::eyre!("{}", err))
            .context("Failed installing diagnostics subscriber")
    }

    fn load_config(&self) -> eyre::Result<Config> {
        let path = self
            .config
            .clone()
            .or_else(default_config_path)
            .ok_or_eyre("No configuration path given and no default location available")?;

        log::debug!("loading configuration from {}", path.display());
        Config::load(&path)
            .wrap_err_with(|| format!("Failed loading configuration {}", path.display()))
    }

    pub fn run(self) -> eyre::Result<()> {
        self.setup_diagnostics()?;
        log::info!("running command {}", &self.cmd);

        let config = self.load_config()?;
        let result = match &self.cmd {
            TelemetryCmd::Emit(emit) => emit.run(&config),
            TelemetryCmd::Check(check) => check.run(&config),
        };

        if let Err(msg) = &result {
            log::error!(
                "failed running command {}, error={} cause={}",
                &self.cmd,
                msg,
                msg.root_cause()
            );
        }

        result
    }
}
