use thiserror::Error;

/// Failures raised by the catalog clients. The resolver and enricher treat
/// every variant the same way: log it and move on with no data.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    #[error("client is not configured")]
    Unconfigured,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] config::ConfigError),
}
