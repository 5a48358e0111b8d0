//! Error types for the uptime reporter

use std::fmt;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug)]
pub enum ReportError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Health-check log line could not be parsed
    LogParse(String),

    /// A log or catalog source answered with something unusable
    Source(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "IO error: {}", err),
            ReportError::Http(err) => write!(f, "HTTP error: {}", err),
            ReportError::Json(err) => write!(f, "JSON error: {}", err),
            ReportError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ReportError::LogParse(msg) => write!(f, "Log parsing error: {}", msg),
            ReportError::Source(msg) => write!(f, "Source error: {}", msg),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            ReportError::Http(err) => Some(err),
            ReportError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::Http(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ReportError::LogParse("missing comma".to_string());
        assert_eq!(err.to_string(), "Log parsing error: missing comma");

        let err = ReportError::Config("env cannot be empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: env cannot be empty");
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ReportError = io.into();
        assert!(matches!(err, ReportError::Io(_)));
        assert!(err.source().is_some());
    }
}
