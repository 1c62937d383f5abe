use crate::{error::MonitorError, measurement::MeasurementLog};

pub const TIME_AXIS_LABEL: &str = "Time (seconds)";
pub const CONNECTIONS_TITLE: &str = "Active Connections";
pub const CONNECTIONS_AXIS_LABEL: &str = "Number of Connections";
pub const LATENCY_TITLE: &str = "Query Duration";
pub const LATENCY_AXIS_LABEL: &str = "Duration (ms)";

/// Everything needed to draw one panel, independent of where it lands.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDescriptor {
    title: String,
    x_label: String,
    y_label: String,
    points: Vec<(f64, f64)>,
}

impl PanelDescriptor {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        points: Vec<(f64, f64)>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            points,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    #[must_use]
    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

/// Builds the connection and latency panels, in that order.
///
/// Point `i` of each panel comes from measurement `i`. Degraded measurements
/// plot as zero connections.
///
/// # Errors
/// Returns [`MonitorError::EmptyLog`] when there is nothing to plot.
#[allow(clippy::cast_precision_loss)]
pub fn measurement_panels(log: &MeasurementLog) -> Result<Vec<PanelDescriptor>, MonitorError> {
    if log.is_empty() {
        return Err(MonitorError::EmptyLog);
    }

    let times = log.relative_seconds();
    let (connections, latencies): (Vec<_>, Vec<_>) = log
        .iter()
        .zip(&times)
        .map(|(m, &t)| {
            (
                (t, m.connections().unwrap_or(0) as f64),
                (t, m.query_latency().as_micros() as f64 / 1000.0),
            )
        })
        .unzip();

    Ok(vec![
        PanelDescriptor::new(
            CONNECTIONS_TITLE,
            TIME_AXIS_LABEL,
            CONNECTIONS_AXIS_LABEL,
            connections,
        ),
        PanelDescriptor::new(LATENCY_TITLE, TIME_AXIS_LABEL, LATENCY_AXIS_LABEL, latencies),
    ])
}
