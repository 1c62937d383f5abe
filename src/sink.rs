use crate::error::MonitorError;
use chrono::{DateTime, TimeZone};
use std::{
    fmt::Display,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

pub const DEFAULT_PREFIX: &str = "clickhouse-metrics";

/// Destination for an encoded chart.
pub trait ChartSink {
    /// Delivers the encoded image.
    ///
    /// # Errors
    /// Returns [`MonitorError::Output`] when the bytes cannot be delivered.
    fn write_chart(&mut self, png: &[u8]) -> Result<(), MonitorError>;
}

impl ChartSink for Vec<u8> {
    fn write_chart(&mut self, png: &[u8]) -> Result<(), MonitorError> {
        self.extend_from_slice(png);
        Ok(())
    }
}

/// Writes the chart to a file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink for `<dir>/<prefix>-<YYYYMMDD-HHMMSS>.png`.
    #[must_use]
    pub fn timestamped<Tz>(dir: impl AsRef<Path>, prefix: &str, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self::new(dir.as_ref().join(default_file_name(prefix, now)))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSink for FileSink {
    fn write_chart(&mut self, png: &[u8]) -> Result<(), MonitorError> {
        File::create(&self.path)
            .and_then(|mut file| {
                file.write_all(png)?;
                file.flush()
            })
            .map_err(|e| MonitorError::output_at(&self.path, e))?;
        log::info!("Chart saved as {}", self.path.display());
        Ok(())
    }
}

/// Suggested chart file name, e.g. `clickhouse-metrics-20240501-134502.png`.
#[must_use]
pub fn default_file_name<Tz>(prefix: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{prefix}-{}.png", now.format("%Y%m%d-%H%M%S"))
}
