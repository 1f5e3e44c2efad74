use thiserror::Error;

use crate::rate_limit::LimiterConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limiter configuration error: {0}")]
    Limiter(#[from] LimiterConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
