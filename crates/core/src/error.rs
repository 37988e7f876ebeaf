#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed timing: {0}")]
    MalformedTiming(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
