use thiserror::Error;

/// Failures talking to the stats service. Report failures are logged and
/// dropped by the caller; the local timer never waits on them.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("stats request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("stats service returned status {status}")]
    Status { status: u16 },
}
