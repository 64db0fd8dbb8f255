use std::{
    cell::Cell,
    future::Future,
    sync::mpsc::{self, RecvTimeoutError},
    time::Duration,
};

use tokio::runtime::Runtime;

use crate::errors::DeliveryError;

// Extra time the caller waits beyond the task's own timeout before giving up.
const GRACE: Duration = Duration::from_millis(250);

thread_local! {
    static DRIVER_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// True on threads owned by a driver runtime.
pub(crate) fn is_driver_thread() -> bool {
    DRIVER_THREAD.with(Cell::get)
}

/// A private Tokio runtime that lets synchronous `deliver` calls drive async
/// clients.
///
/// Work is spawned onto the runtime and the caller waits on a plain channel,
/// so this is usable from ordinary threads and from inside another runtime
/// alike. Every call is bounded by `timeout`.
pub(crate) struct DriverRuntime {
    runtime: Option<Runtime>,
    timeout: Duration,
}

impl DriverRuntime {
    pub(crate) fn new(name: &str, timeout: Duration) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(format!("telemetry-{}", name))
            .on_thread_start(|| DRIVER_THREAD.with(|flag| flag.set(true)))
            .enable_all()
            .build()?;

        Ok(Self {
            runtime: Some(runtime),
            timeout,
        })
    }

    pub(crate) fn run<F, T>(&self, future: F) -> Result<T, DeliveryError>
    where
        F: Future<Output = Result<T, DeliveryError>> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = self.runtime.as_ref().ok_or(DeliveryError::Closed)?;
        let timeout = self.timeout;
        let (sender, receiver) = mpsc::sync_channel(1);

        runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout(timeout)),
            };
            let _ = sender.send(result);
        });

        match receiver.recv_timeout(timeout + GRACE) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(DeliveryError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(DeliveryError::transport("driver task aborted"))
            }
        }
    }
}

impl Drop for DriverRuntime {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
