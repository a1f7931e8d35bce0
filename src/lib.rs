// tidepool - Transport connection pool with multiplexed sharing

pub mod config;
pub mod net;
pub mod pool;
pub mod telemetry;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, LoggingConfig, PoolOptions};
pub use net::{Address, Poolable, Scheme};
pub use pool::{Pool, PoolStats};
pub use utils::error::{PoolError, Result};
