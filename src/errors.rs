/// Domain-specific error types for the dashboard engine.
/// The pipeline must:
/// - Fall back to the synthetic registry when the registry is unavailable
/// - Surface per-model source failures instead of silently dropping them
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("tournament API error: {status} {body}")]
    Api { status: u16, body: String },

    #[error("performance source unavailable for {model}: {reason}")]
    SourceUnavailable { model: String, reason: String },

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl DashboardError {
    /// Wrap any failure raised while fetching one model's rounds.
    pub fn source_unavailable(model: &str, err: impl std::fmt::Display) -> Self {
        DashboardError::SourceUnavailable {
            model: model.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        DashboardError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Parse(e.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::RegistryUnavailable(e.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        DashboardError::Io(e.to_string())
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
