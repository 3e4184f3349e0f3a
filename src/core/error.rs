//! Application-wide error types.
//!
//! Only startup paths (config, logger, listener bind) surface an [`AppError`]
//! to `main`.  Storage and model failures have their own error enums and are
//! absorbed by the status log and the story chain respectively.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("comms error: {0}")]
    Comms(String),
}
