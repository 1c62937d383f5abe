mod clickhouse;

pub use clickhouse::{ClickHouseSource, ClickHouseSourceBuilder, Target};

use crate::error::QueryError;

/// A session able to produce one scalar sample per call.
///
/// The sampler times each call, so implementations only report the value.
pub trait MetricSource: Send + 'static {
    /// Runs the sampling query once.
    ///
    /// # Errors
    /// Returns a [`QueryError`] when the query cannot be executed or its result
    /// cannot be decoded. The sampler records this as a degraded measurement.
    fn query_sample(&mut self) -> Result<u64, QueryError>;
}

impl<F> MetricSource for F
where
    F: FnMut() -> Result<u64, QueryError> + Send + 'static,
{
    fn query_sample(&mut self) -> Result<u64, QueryError> {
        self()
    }
}
