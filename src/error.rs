use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing source columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unknown range filter '{0}' (expected one of All, YTD, 12M, 3M, 1M)")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
