use log::{LevelFilter, Log};
use serde_json::Value;

use crate::{drivers::is_driver_thread, errors::ConfigurationError};

use super::{is_dispatching, Dispatcher, Metadata, Severity};

/// Crates whose records would feed back into the drivers that produced them.
/// Some of them log from their own worker threads (the SQLite connection
/// worker for one), where neither thread flag is set.
const IGNORED_CRATES: [&str; 14] = [
    "telemetry_logging",
    "sqlx",
    "sqlx_core",
    "sqlx_sqlite",
    "hyper",
    "hyper_util",
    "hyper_rustls",
    "rustls",
    "h2",
    "tokio",
    "mio",
    "want",
    "librdkafka",
    "rdkafka",
];

fn is_ignored(target: &str) -> bool {
    let krate = target.split("::").next().unwrap_or(target);

    is_dispatching() || is_driver_thread() || IGNORED_CRATES.contains(&krate)
}

impl Dispatcher {
    /// Registers a view of this dispatcher as the process-wide `log` backend.
    ///
    /// The installed view shares the live driver set, so drivers added later
    /// still receive `log` records. Its threshold is the one in effect now.
    pub fn install(&self) -> Result<(), ConfigurationError> {
        log::set_boxed_logger(Box::new(self.view(self.trace_id().map(str::to_string))))
            .map_err(|_| ConfigurationError::LoggerInstalled)?;
        log::set_max_level(LevelFilter::Trace);

        Ok(())
    }
}

impl Log for Dispatcher {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Severity::from(metadata.level()) >= self.threshold()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) || is_ignored(record.target()) {
            return;
        }

        let metadata = Metadata::from([(
            "target".to_string(),
            Value::from(record.target()),
        )]);

        Dispatcher::log(
            self,
            Severity::from(record.level()),
            record.args().to_string(),
            Some(metadata),
        );
    }

    fn flush(&self) {
        Dispatcher::flush(self)
    }
}
