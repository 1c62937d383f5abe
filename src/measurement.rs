use crate::error::MonitorError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    time::{Duration, Instant},
};

/// One sample taken by the sampler.
///
/// `connections` is `None` when the sampling query failed. Such a degraded
/// measurement still carries the tick's timestamp and the time spent before
/// the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    timestamp: DateTime<Utc>,
    connections: Option<u64>,
    query_latency: Duration,
}

impl Measurement {
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        connections: Option<u64>,
        query_latency: Duration,
    ) -> Self {
        Self {
            timestamp,
            connections,
            query_latency,
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn connections(&self) -> Option<u64> {
        self.connections
    }

    #[must_use]
    pub const fn query_latency(&self) -> Duration {
        self.query_latency
    }

    /// True when the query behind this sample failed.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.connections.is_none()
    }
}

/// Wall-clock anchor plus a monotonic offset.
///
/// Timestamps handed out by one clock never go backwards, even if the system
/// clock is adjusted mid-session.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl SessionClock {
    #[must_use]
    pub fn start() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.mono.elapsed())
            .ok()
            .and_then(|elapsed| self.wall.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Append-only, chronologically ordered history of one monitoring session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MeasurementLog {
    entries: Vec<Measurement>,
}

impl MeasurementLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a measurement. A timestamp earlier than the last entry's is
    /// clamped to it so the log stays non-decreasing.
    pub fn push(&mut self, mut measurement: Measurement) {
        if let Some(last) = self.entries.last() {
            if measurement.timestamp < last.timestamp {
                log::debug!(
                    "clamping out-of-order measurement {} to {}",
                    measurement.timestamp,
                    last.timestamp
                );
                measurement.timestamp = last.timestamp;
            }
        }
        self.entries.push(measurement);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.entries.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Measurement> {
        self.entries.first()
    }

    /// Seconds elapsed since the first measurement, one value per entry.
    #[must_use]
    pub fn relative_seconds(&self) -> Vec<f64> {
        let Some(t0) = self.first().map(Measurement::timestamp) else {
            return Vec::new();
        };
        self.entries
            .iter()
            .map(|m| {
                (m.timestamp - t0)
                    .to_std()
                    .unwrap_or_default()
                    .as_secs_f64()
            })
            .collect()
    }

    /// Writes a MessagePack snapshot of the log to `path`.
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), MonitorError> {
        let path = path.as_ref();
        let bytes: Vec<u8> = self.try_into()?;
        std::fs::write(path, bytes).map_err(|e| MonitorError::output_at(path, e))
    }

    /// Reads a snapshot previously written by [`MeasurementLog::write_to`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| MonitorError::output_at(path, e))?;
        Self::try_from(bytes.as_slice())
    }
}

impl Extend<Measurement> for MeasurementLog {
    fn extend<I: IntoIterator<Item = Measurement>>(&mut self, iter: I) {
        for measurement in iter {
            self.push(measurement);
        }
    }
}

impl FromIterator<Measurement> for MeasurementLog {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        let mut log = Self::new();
        log.extend(iter);
        log
    }
}

impl<'a> IntoIterator for &'a MeasurementLog {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> Deserialize<'de> for MeasurementLog {
    // Re-append through `push` so a hand-edited snapshot cannot break ordering.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Measurement>::deserialize(deserializer).map(Self::from_iter)
    }
}

impl TryFrom<&[u8]> for MeasurementLog {
    type Error = MonitorError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        rmp_serde::from_slice(buffer).map_err(MonitorError::from)
    }
}

impl TryFrom<&MeasurementLog> for Vec<u8> {
    type Error = MonitorError;

    fn try_from(log: &MeasurementLog) -> Result<Self, Self::Error> {
        rmp_serde::to_vec(log).map_err(MonitorError::from)
    }
}
