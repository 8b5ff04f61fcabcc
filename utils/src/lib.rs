mod logging;
mod retry;

pub use logging::{level_from_str, setup_logging, LOG_LEVEL_ENV};
pub use retry::RetryPolicy;
