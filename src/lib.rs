#![warn(clippy::pedantic, clippy::nursery, clippy::cargo, clippy::perf)]

//! # `ch_load_chart`
//!
//! Samples a ClickHouse server's active connection count and the latency of
//! the sampling query, keeps the samples in memory for the session, and on
//! termination renders them as a two-panel PNG chart.
//!
//! The pieces compose as follows:
//!
//! ```no_run
//! use ch_load_chart::{ChartRenderer, ClickHouseSource, FileSink, Sampler, ShutdownCoordinator, Target};
//!
//! let source = ClickHouseSource::builder(Target::parse("clickhouse://default@localhost")?).connect()?;
//! let coordinator = ShutdownCoordinator::install()?;
//! let sampler = Sampler::default().start(source)?;
//!
//! // Blocks until Ctrl+C, then takes the log back from the sampler thread.
//! let log = coordinator.run(sampler)?;
//!
//! let mut sink = FileSink::timestamped(".", "clickhouse-metrics", &chrono::Local::now());
//! ChartRenderer::new().render_to(&log, &mut sink)?;
//! # Ok::<(), ch_load_chart::MonitorError>(())
//! ```
//!
//! The sampler thread is the only writer of its [`MeasurementLog`]. The log
//! moves to the caller through the stop handshake, so reading it never
//! races with an append.

pub mod chart;
mod error;
mod measurement;
mod sampler;
pub mod shutdown;
mod sink;
mod source;

pub use chart::ChartRenderer;
pub use error::{MonitorError, QueryError};
pub use measurement::{Measurement, MeasurementLog, SessionClock};
pub use sampler::{Sampler, SamplerHandle};
pub use shutdown::ShutdownCoordinator;
pub use sink::{ChartSink, DEFAULT_PREFIX, FileSink, default_file_name};
pub use source::{ClickHouseSource, ClickHouseSourceBuilder, MetricSource, Target};
