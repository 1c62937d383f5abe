//! Stop handshake between the main thread and a worker, and the coordinator
//! that turns an operator interrupt into that handshake.
//!
//! A stop is two messages: the controller asks the worker to stop, then blocks
//! until the worker acknowledges by handing back its result. Receiving the
//! acknowledgement is the happens-before edge: once [`StopHandle::stop`]
//! returns, the worker has finished touching the value it handed over.

use crate::{error::MonitorError, measurement::MeasurementLog, sampler::SamplerHandle};
use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError},
    time::Duration,
};

/// Creates a connected controller/worker pair.
#[must_use]
pub fn stop_channel<T>() -> (StopHandle<T>, StopListener<T>) {
    let (stop_tx, stop_rx) = mpsc::sync_channel(1);
    let (ack_tx, ack_rx) = mpsc::sync_channel(1);
    (
        StopHandle { stop_tx, ack_rx },
        StopListener { stop_rx, ack_tx },
    )
}

/// Controller side of the handshake.
#[derive(Debug)]
pub struct StopHandle<T> {
    stop_tx: SyncSender<()>,
    ack_rx: Receiver<T>,
}

impl<T> StopHandle<T> {
    /// Requests a stop and blocks until the worker acknowledges with its result.
    ///
    /// # Errors
    /// Returns [`MonitorError::Sampler`] if the worker went away without
    /// acknowledging, for instance because it panicked.
    pub fn stop(self) -> Result<T, MonitorError> {
        // A full buffer means a stop is already pending.
        let _ = self.stop_tx.try_send(());
        self.ack_rx
            .recv()
            .map_err(|_| MonitorError::Sampler("worker dropped its stop listener".into()))
    }
}

/// Worker side of the handshake.
#[derive(Debug)]
pub struct StopListener<T> {
    stop_rx: Receiver<()>,
    ack_tx: SyncSender<T>,
}

impl<T> StopListener<T> {
    /// Non-blocking check for a pending stop. A dropped controller counts as one.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        !matches!(self.stop_rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleeps for up to `period`, waking early when a stop arrives.
    /// Returns true if the worker should stop.
    #[must_use]
    pub fn wait(&self, period: Duration) -> bool {
        !matches!(
            self.stop_rx.recv_timeout(period),
            Err(RecvTimeoutError::Timeout)
        )
    }

    /// Completes the handshake by handing `value` to the controller.
    pub fn acknowledge(self, value: T) {
        if self.ack_tx.send(value).is_err() {
            log::debug!("stop acknowledged after the controller went away");
        }
    }
}

/// Waits for the operator's termination request, then stops the sampler.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    requests: Receiver<()>,
}

impl ShutdownCoordinator {
    /// Hooks SIGINT and SIGTERM. Only the first request is delivered; repeats
    /// while one is pending are dropped.
    ///
    /// # Errors
    /// Returns [`MonitorError::Signal`] if a handler is already installed or the
    /// OS refuses the registration.
    pub fn install() -> Result<Self, MonitorError> {
        let (tx, rx) = mpsc::sync_channel(1);
        ctrlc::set_handler(move || {
            let _ = tx.try_send(());
        })?;
        Ok(Self::from_requests(rx))
    }

    /// Uses an arbitrary channel as the termination source. A disconnected
    /// channel counts as a request.
    #[must_use]
    pub const fn from_requests(requests: Receiver<()>) -> Self {
        Self { requests }
    }

    /// Blocks until termination is requested.
    pub fn wait_for_termination(&self) {
        if self.requests.recv().is_err() {
            log::debug!("termination source closed");
        }
    }

    /// Stops the sampler and returns its now quiescent log.
    ///
    /// # Errors
    /// Propagates [`SamplerHandle::stop`] failures.
    pub fn signal_stop(&self, sampler: SamplerHandle) -> Result<MeasurementLog, MonitorError> {
        log::info!("Stopping monitoring and generating chart...");
        let log = sampler.stop()?;
        log::info!("Sampler stopped after {} measurements", log.len());
        Ok(log)
    }

    /// [`Self::wait_for_termination`] followed by [`Self::signal_stop`].
    ///
    /// # Errors
    /// Propagates [`SamplerHandle::stop`] failures.
    pub fn run(self, sampler: SamplerHandle) -> Result<MeasurementLog, MonitorError> {
        self.wait_for_termination();
        self.signal_stop(sampler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    #[test]
    fn listener_sees_stop_and_acknowledges() {
        let (handle, listener) = stop_channel::<&str>();
        let worker = thread::spawn(move || {
            while !listener.wait(Duration::from_millis(1)) {}
            listener.acknowledge("done");
        });

        assert_eq!(handle.stop().unwrap(), "done");
        worker.join().unwrap();
    }

    #[test]
    fn dropped_controller_reads_as_stop() {
        let (handle, listener) = stop_channel::<()>();
        assert!(!listener.is_requested());
        drop(handle);
        assert!(listener.is_requested());
        assert!(listener.wait(Duration::from_secs(5)));
    }

    #[test]
    fn missing_acknowledgement_is_an_error() {
        let (handle, listener) = stop_channel::<u32>();
        drop(listener);
        assert!(matches!(handle.stop(), Err(MonitorError::Sampler(_))));
    }

    #[test]
    fn no_appends_observed_after_handshake() {
        for _ in 0..200 {
            let appends = Arc::new(AtomicUsize::new(0));
            let (handle, listener) = stop_channel::<Vec<usize>>();

            let counter = Arc::clone(&appends);
            let worker = thread::spawn(move || {
                let mut items = Vec::new();
                loop {
                    if listener.is_requested() {
                        break;
                    }
                    items.push(counter.fetch_add(1, Ordering::SeqCst));
                    if listener.wait(Duration::ZERO) {
                        break;
                    }
                }
                listener.acknowledge(items);
            });

            thread::yield_now();
            let items = handle.stop().unwrap();
            let seen = appends.load(Ordering::SeqCst);
            worker.join().unwrap();

            assert_eq!(items.len(), seen);
            assert_eq!(appends.load(Ordering::SeqCst), seen);
        }
    }

    #[test]
    fn closed_request_channel_terminates_wait() {
        let (tx, rx) = mpsc::sync_channel(1);
        let coordinator = ShutdownCoordinator::from_requests(rx);
        drop(tx);
        coordinator.wait_for_termination();
    }
}
