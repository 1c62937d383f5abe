use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("failed to establish session with ClickHouse: {0}")]
    Session(#[source] QueryError),
    #[error("no measurements to plot")]
    EmptyLog,
    #[error("failed to render chart: {0}")]
    Render(String),
    #[error("IO error {0}")]
    Output(#[from] std::io::Error),
    #[error("sampler exited without acknowledging stop: {0}")]
    Sampler(String),
    #[error("failed to install termination handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("couldnt serialize measurement log: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("failed to deserialize measurement log: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
}

/// Failure of a single sampling query. The sampler absorbs these; only session
/// establishment escalates one into a [`MonitorError`].
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response body {0:?}")]
    Decode(String),
}

impl MonitorError {
    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        Self::Render(err.to_string())
    }

    /// Output error that names the file it was about.
    pub(crate) fn output_at(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Output(std::io::Error::new(
            err.kind(),
            format!("{}: {err}", path.display()),
        ))
    }
}
