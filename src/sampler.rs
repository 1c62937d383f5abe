use crate::{
    error::MonitorError,
    measurement::{Measurement, MeasurementLog, SessionClock},
    shutdown::{StopHandle, StopListener, stop_channel},
    source::MetricSource,
};
use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const CONNECTIONS_GAUGE: &str = "ch_load_chart.connections";
const QUERY_DURATION_HISTOGRAM: &str = "ch_load_chart.query_duration_ms";
const SAMPLE_ERRORS_COUNTER: &str = "ch_load_chart.sample_errors";

pub struct Sampler {
    period: Duration,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(300),
        }
    }
}

impl Sampler {
    /// Sets the pause between two samples.
    #[must_use]
    pub const fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Spawns the sampling thread. It queries `source` once per period and
    /// owns the resulting [`MeasurementLog`] until [`SamplerHandle::stop`]
    /// takes it back.
    ///
    /// # Example
    /// ```no_run
    /// use ch_load_chart::{ClickHouseSource, Sampler, Target};
    ///
    /// let target = Target::parse("clickhouse://default@localhost")?;
    /// let source = ClickHouseSource::builder(target).connect()?;
    /// let sampler = Sampler::default().start(source)?;
    /// // ... later
    /// let log = sampler.stop()?;
    /// # Ok::<(), ch_load_chart::MonitorError>(())
    /// ```
    ///
    /// # Errors
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn start<S: MetricSource>(self, source: S) -> Result<SamplerHandle, MonitorError> {
        let (stop, listener) = stop_channel();
        let period = self.period;
        describe_metrics();

        let worker = thread::Builder::new()
            .name("ch-sampler".into())
            .spawn(move || run_sampler(source, period, listener))
            .map_err(|e| MonitorError::Sampler(e.to_string()))?;

        Ok(SamplerHandle { stop, worker })
    }
}

/// Owner's handle on a running sampler.
#[derive(Debug)]
pub struct SamplerHandle {
    stop: StopHandle<MeasurementLog>,
    worker: JoinHandle<()>,
}

impl SamplerHandle {
    /// Signals the sampler and blocks until it hands back its log.
    ///
    /// A query already in flight is allowed to finish and is kept in the log.
    ///
    /// # Errors
    /// Returns [`MonitorError::Sampler`] if the sampler thread died first.
    pub fn stop(self) -> Result<MeasurementLog, MonitorError> {
        let acked = self.stop.stop();
        let joined = self.worker.join();
        match (acked, joined) {
            (Ok(log), Ok(())) => Ok(log),
            (_, Err(panic)) => Err(MonitorError::Sampler(panic_message(panic.as_ref()))),
            (Err(e), Ok(())) => Err(e),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "sampler thread panicked".into())
}

fn run_sampler<S: MetricSource>(
    mut source: S,
    period: Duration,
    listener: StopListener<MeasurementLog>,
) {
    let clock = SessionClock::start();
    let mut log = MeasurementLog::new();

    while !listener.is_requested() {
        log.push(take_measurement(&mut source, &clock));
        if listener.wait(period) {
            break;
        }
    }

    log::debug!("sampler observed stop after {} ticks", log.len());
    listener.acknowledge(log);
}

#[allow(clippy::cast_precision_loss)]
fn take_measurement<S: MetricSource>(source: &mut S, clock: &SessionClock) -> Measurement {
    let timestamp = clock.now();
    let started = Instant::now();
    let outcome = source.query_sample();
    let elapsed = started.elapsed();

    metrics::histogram!(QUERY_DURATION_HISTOGRAM).record(elapsed.as_secs_f64() * 1000.0);
    let connections = match outcome {
        Ok(count) => {
            log::info!("Collected metrics {count}");
            metrics::gauge!(CONNECTIONS_GAUGE).set(count as f64);
            Some(count)
        }
        Err(e) => {
            log::warn!("Error querying ClickHouse: {e}");
            metrics::counter!(SAMPLE_ERRORS_COUNTER).increment(1);
            None
        }
    };

    Measurement::new(timestamp, connections, elapsed)
}

fn describe_metrics() {
    metrics::describe_gauge!(CONNECTIONS_GAUGE, "Active TCP and HTTP connections");
    metrics::describe_histogram!(
        QUERY_DURATION_HISTOGRAM,
        metrics::Unit::Milliseconds,
        "Duration of the sampling query"
    );
    metrics::describe_counter!(SAMPLE_ERRORS_COUNTER, "Sampling queries that failed");
}
