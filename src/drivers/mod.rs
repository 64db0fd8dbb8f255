//! Built-in drivers. Each one is a thin wrapper around its transport and
//! applies its own severity threshold before doing any I/O.

mod console;
mod database;
mod file;
#[cfg(feature = "kafka")]
mod kafka;
mod network;
mod runtime;
mod search;
mod syslog;

use std::sync::Arc;

pub use console::ConsoleDriver;
pub use database::DatabaseDriver;
pub use file::FileDriver;
#[cfg(feature = "kafka")]
pub use kafka::KafkaDriver;
pub use network::HttpDriver;
pub use search::SearchIndexDriver;
pub use syslog::{priority, Facility, SyslogDriver};

pub(crate) use runtime::is_driver_thread;

use crate::{config::DriverRegistry, logging::Driver};

fn shared<D: Driver + 'static>(driver: D) -> Arc<dyn Driver> {
    Arc::new(driver)
}

pub(crate) fn register_builtin(registry: &mut DriverRegistry) {
    for kind in ["console", "cli"] {
        registry.register(kind, |settings| ConsoleDriver::from_settings(settings).map(shared));
    }
    registry.register("file", |settings| FileDriver::from_settings(settings).map(shared));
    for kind in ["database", "db"] {
        registry.register(kind, |settings| DatabaseDriver::from_settings(settings).map(shared));
    }
    for kind in ["elasticsearch", "search"] {
        registry.register(kind, |settings| {
            SearchIndexDriver::from_settings(settings).map(shared)
        });
    }
    for kind in ["http", "network"] {
        registry.register(kind, |settings| HttpDriver::from_settings(settings).map(shared));
    }
    registry.register("syslog", |settings| SyslogDriver::from_settings(settings).map(shared));
    #[cfg(feature = "kafka")]
    registry.register("kafka", |settings| KafkaDriver::from_settings(settings).map(shared));
}
