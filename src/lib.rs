//! Structured logging facade that fans each event out to several drivers.
//!
//! ```no_run
//! use telemetry_logging::{drivers::ConsoleDriver, Dispatcher, Severity, Transaction};
//!
//! let logger = Dispatcher::builder()
//!     .with_threshold(Severity::Info)
//!     .with_driver(ConsoleDriver::new(Severity::Info))
//!     .build();
//!
//! logger.info("service started", None);
//!
//! let txn = Transaction::new(Default::default());
//! txn.logger_for(&logger).warn("payment retried", None);
//! ```

pub mod config;
pub mod drivers;
pub mod errors;
pub mod logging;
mod utils;

pub use config::{Config, DriverRegistry};
pub use errors::{ConfigurationError, DeliveryError, UnknownSeverity};
pub use logging::{
    DeliveryFailure, Dispatcher, Driver, Event, EventFormatter, Metadata, Severity, Transaction,
};
