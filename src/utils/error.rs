use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Maintenance worker unavailable")]
    MaintenanceUnavailable,
}

pub type Result<T> = std::result::Result<T, PoolError>;
