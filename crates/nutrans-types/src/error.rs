use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid axis: {0}")]
    InvalidAxis(String),

    #[error("Invalid CDF: {0}")]
    InvalidCdf(String),

    #[error("Degenerate metric: {0}")]
    DegenerateMetric(String),

    #[error("Zone index out of bounds: index={index}, n_zones={n_zones}")]
    ZoneIndex { index: usize, n_zones: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
