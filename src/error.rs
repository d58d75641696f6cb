use thiserror::Error;

/// Failures surfaced by the remote client and configuration layer.
///
/// Normalization deliberately has no error type: malformed data is repaired
/// or dropped, and the caller falls back down the chain. Storage failures are
/// logged and swallowed at the adapter.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}
