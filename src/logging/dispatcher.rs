use std::{
    cell::Cell,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use crate::errors::DeliveryError;

use super::{Driver, Event, Metadata, Severity};

/// Receives every delivery failure of a dispatcher and all views derived
/// from it.
pub type FailureObserver = Arc<dyn Fn(&DeliveryFailure<'_>) + Send + Sync>;

/// One failed delivery, as reported to a [`FailureObserver`].
#[derive(Debug)]
pub struct DeliveryFailure<'a> {
    /// Position of the driver in registration order.
    pub index: usize,
    pub driver: &'a str,
    pub event: &'a Event,
    pub error: &'a DeliveryError,
}

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is inside a fan-out loop.
pub(crate) fn is_dispatching() -> bool {
    DISPATCHING.with(Cell::get)
}

struct DispatchGuard {
    previous: bool,
}

impl DispatchGuard {
    fn enter() -> Self {
        Self {
            previous: DISPATCHING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(self.previous));
    }
}

#[derive(Default)]
struct Registry {
    drivers: Vec<Arc<dyn Driver>>,
    observer: Option<FailureObserver>,
}

/// Severity-filtered fan-out of log events to every registered driver.
///
/// A dispatcher is safe to share between threads. Views returned by
/// [`Dispatcher::with_trace`] share the live driver registry with their parent:
/// a driver added through any of them is seen by all of them. Each view owns
/// its threshold (copied at derivation time) and its trace identifier.
pub struct Dispatcher {
    registry: Arc<Mutex<Registry>>,
    threshold: AtomicU8,
    trace_id: Option<String>,
}

impl Dispatcher {
    /// Creates a dispatcher with no drivers and a DEBUG threshold.
    pub fn new() -> Self {
        Self::with_registry(Registry::default(), Severity::Debug)
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    fn with_registry(registry: Registry, threshold: Severity) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            threshold: AtomicU8::new(threshold.rank()),
            trace_id: None,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // A panicking observer must not disable logging for everyone else.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_driver(&self, driver: impl Driver + 'static) {
        self.add_shared_driver(Arc::new(driver));
    }

    /// Registers an already shared driver. The same driver may be registered
    /// more than once and then receives each event once per registration.
    pub fn add_shared_driver(&self, driver: Arc<dyn Driver>) {
        self.registry().drivers.push(driver);
    }

    pub fn driver_count(&self) -> usize {
        self.registry().drivers.len()
    }

    pub fn set_threshold(&self, level: Severity) {
        self.threshold.store(level.rank(), Ordering::Release);
    }

    pub fn threshold(&self) -> Severity {
        Severity::from_rank(self.threshold.load(Ordering::Acquire))
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn set_failure_observer<F>(&self, observer: F)
    where
        F: Fn(&DeliveryFailure<'_>) + Send + Sync + 'static,
    {
        self.registry().observer = Some(Arc::new(observer));
    }

    /// Returns a view bound to `trace_id`. An empty identifier yields a view
    /// without a trace.
    pub fn with_trace(&self, trace_id: impl Into<String>) -> Dispatcher {
        let trace_id: String = trace_id.into();
        self.view((!trace_id.is_empty()).then_some(trace_id))
    }

    pub(crate) fn view(&self, trace_id: Option<String>) -> Dispatcher {
        Dispatcher {
            registry: Arc::clone(&self.registry),
            threshold: AtomicU8::new(self.threshold().rank()),
            trace_id,
        }
    }

    /// Builds one event and hands it to every driver in registration order.
    ///
    /// Events below the threshold are discarded before anything is built.
    /// Driver failures, including panics, are reported to the failure
    /// observer and never interrupt delivery to the remaining drivers.
    pub fn log(&self, level: Severity, message: impl Into<String>, metadata: Option<Metadata>) {
        if level < self.threshold() {
            return;
        }

        let event = Event::new(level, message, metadata, self.trace_id.as_deref());

        let (drivers, observer) = {
            let registry = self.registry();
            (registry.drivers.clone(), registry.observer.clone())
        };

        let _guard = DispatchGuard::enter();
        for (index, driver) in drivers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| driver.deliver(&event)))
                .unwrap_or(Err(DeliveryError::Panicked));

            if let Err(error) = outcome {
                let failure = DeliveryFailure {
                    index,
                    driver: driver.name(),
                    event: &event,
                    error: &error,
                };
                match &observer {
                    Some(observer) => {
                        // A panicking observer loses this report, not the event.
                        let _ = panic::catch_unwind(AssertUnwindSafe(|| observer(&failure)));
                    }
                    None => log::warn!(
                        "driver #{} ({}) dropped event: {}",
                        index,
                        failure.driver,
                        error
                    ),
                }
            }
        }
    }

    pub fn debug(&self, message: impl Into<String>, metadata: Option<Metadata>) {
        self.log(Severity::Debug, message, metadata)
    }

    pub fn info(&self, message: impl Into<String>, metadata: Option<Metadata>) {
        self.log(Severity::Info, message, metadata)
    }

    pub fn warn(&self, message: impl Into<String>, metadata: Option<Metadata>) {
        self.log(Severity::Warn, message, metadata)
    }

    pub fn error(&self, message: impl Into<String>, metadata: Option<Metadata>) {
        self.log(Severity::Error, message, metadata)
    }

    pub fn flush(&self) {
        let drivers = self.registry().drivers.clone();
        for driver in drivers {
            driver.flush();
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("threshold", &self.threshold())
            .field("trace_id", &self.trace_id)
            .field("drivers", &self.driver_count())
            .finish()
    }
}

pub struct Builder {
    threshold: Severity,
    registry: Registry,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            threshold: Severity::Debug,
            registry: Registry::default(),
        }
    }

    pub fn with_threshold(self, threshold: Severity) -> Self {
        Self { threshold, ..self }
    }

    pub fn with_driver(self, driver: impl Driver + 'static) -> Self {
        self.with_shared_driver(Arc::new(driver))
    }

    pub fn with_shared_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.registry.drivers.push(driver);
        self
    }

    pub fn with_failure_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&DeliveryFailure<'_>) + Send + Sync + 'static,
    {
        self.registry.observer = Some(Arc::new(observer));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher::with_registry(self.registry, self.threshold)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
