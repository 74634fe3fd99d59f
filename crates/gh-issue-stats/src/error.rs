//! Error types for stats computation

/// Errors from computing repository issue statistics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected http status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("page task failed: {0}")]
    Task(String),
}

/// Result alias for stats operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let config_err = Error::Config("concurrency must be greater than 0".into());
        assert_eq!(
            config_err.to_string(),
            "invalid configuration: concurrency must be greater than 0"
        );

        let http_err = Error::Http {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(
            http_err.to_string(),
            "unexpected http status 502: bad gateway"
        );
    }

    #[test]
    fn error_debug_includes_variant() {
        let err = Error::Task("cancelled".into());
        let debug = format!("{err:?}");
        assert!(
            debug.contains("Task"),
            "Debug should include variant name, got: {debug}"
        );
    }
}
