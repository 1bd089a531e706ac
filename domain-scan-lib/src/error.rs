//! Error handling for domain scanning operations.
//!
//! Only configuration errors are fatal to a scan. Everything that can go
//! wrong while querying a single candidate is absorbed by the retry policy
//! and recorded on that candidate's report.

use std::time::Duration;

/// Main error type for domain scanning operations.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Invalid or missing configuration (bad length, unknown method, ...)
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A file that the scan depends on could not be opened or written
    #[error("File error at '{path}': {message}")]
    FileError { path: String, message: String },

    /// The check server could not be reached or hung up without answering
    #[error("Network error: {message}{}", fmt_detail(.detail))]
    NetworkError {
        message: String,
        detail: Option<String>,
    },

    /// An operation exceeded its deadline
    #[error("Timeout after {duration:?} during: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The check server answered with something that is not `<code>: <text>`
    #[error("Parse error: {message}")]
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// I/O failure outside of file opening (e.g. appending to a sink)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            detail: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            detail: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new parse error, keeping the offending response for debugging.
    pub fn parse<M: Into<String>>(message: M, content: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            content,
        }
    }

    /// Whether this error is a transient query failure worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::Timeout { .. })
    }

    /// Whether this error must abort the scan before any query is issued.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigError { .. } | Self::FileError { .. })
    }
}

fn fmt_detail(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" (source: {})", d))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ScanError::network("refused").is_retryable());
        assert!(ScanError::timeout("connect", Duration::from_secs(10)).is_retryable());
        assert!(!ScanError::parse("no colon", None).is_retryable());
        assert!(!ScanError::config("bad length").is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = ScanError::network_with_source("Connection failed", "refused");
        assert_eq!(
            err.to_string(),
            "Network error: Connection failed (source: refused)"
        );

        let err = ScanError::file_error("/tmp/words", "not found");
        assert_eq!(err.to_string(), "File error at '/tmp/words': not found");
        assert!(err.is_configuration());
    }
}
