use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use clap::Args;
use eyre::{eyre, Context};
use serde_json::Value;

use telemetry_logging::{Config, Metadata, Severity, Transaction};

#[derive(Args, Debug)]
pub struct Cmd {
    #[arg(index = 1, help = "The message to log.")]
    pub message: String,

    #[arg(
        short,
        long,
        default_value_t = Severity::Info,
        value_parser = parse_severity,
        help = "Severity of the event: DEBUG, INFO, WARN or ERROR (case-insensitive)."
    )]
    pub level: Severity,

    #[arg(
        short,
        long = "meta",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Attach metadata. Values are parsed as JSON when possible, otherwise kept as text. Repeatable."
    )]
    pub metadata: Vec<(String, Value)>,

    #[arg(
        short,
        long,
        conflicts_with = "new_trace",
        help = "Trace identifier to tag the event with."
    )]
    pub trace: Option<String>,

    #[arg(long, help = "Tag the event with a freshly generated trace identifier and print it.")]
    pub new_trace: bool,
}

fn parse_severity(text: &str) -> eyre::Result<Severity> {
    Ok(text.parse()?)
}

fn parse_key_value(text: &str) -> eyre::Result<(String, Value)> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| eyre!("expected KEY=VALUE, got `{}`", text))?;

    if key.is_empty() {
        return Err(eyre!("metadata key can't be empty: `{}`", text));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl Cmd {
    pub fn run(&self, config: &Config) -> eyre::Result<()> {
        let dispatcher = config
            .initialize()
            .context("Failed initializing logger from configuration")?;

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        dispatcher.set_failure_observer(move |failure| {
            counter.fetch_add(1, Ordering::Relaxed);
            eprintln!(
                "driver #{} ({}) failed: {}",
                failure.index, failure.driver, failure.error
            );
        });

        let metadata: Metadata = self.metadata.iter().cloned().collect();
        let metadata = (!metadata.is_empty()).then_some(metadata);

        let logger = if self.new_trace {
            let txn = Transaction::new(Metadata::new());
            println!("{}", txn.trace_id());
            txn.logger_for(&dispatcher)
        } else {
            match &self.trace {
                Some(trace_id) => dispatcher.with_trace(trace_id.as_str()),
                None => dispatcher,
            }
        };

        logger.log(self.level, self.message.as_str(), metadata);
        logger.flush();

        match failures.load(Ordering::Relaxed) {
            0 => Ok(()),
            count => Err(eyre!("{} driver(s) failed to deliver the event", count)),
        }
    }
}
