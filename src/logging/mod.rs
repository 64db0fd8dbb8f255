mod bridge;
mod dispatcher;
mod event;
mod formatters;
mod severity;
mod transaction;

pub use dispatcher::{Builder, DeliveryFailure, Dispatcher, FailureObserver};
pub use event::{Event, Metadata};
pub use formatters::{JsonFormatter, TextConfig, TextFormatter};
pub use severity::Severity;
pub use transaction::Transaction;

pub(crate) use dispatcher::is_dispatching;

use crate::errors::DeliveryError;

/// Renders an event as a single line of output.
pub trait EventFormatter: Sync + Send {
    fn format(&self, event: &Event) -> Result<String, DeliveryError>;
}

/// An output backend that accepts one event at a time.
///
/// Implementations must not block indefinitely and must report ordinary
/// failures through the returned error rather than panicking. A driver may
/// drop events below its own threshold; the dispatcher's threshold is applied
/// first and does not replace it.
pub trait Driver: Sync + Send {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError>;

    /// Short label used when reporting delivery failures.
    fn name(&self) -> &str {
        "driver"
    }

    fn flush(&self) {}
}
