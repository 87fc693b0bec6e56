use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant is terminal to the operation that produced it; callers turn
/// these into the fixed user-facing strings and never retry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("stream ended early: {0}")]
    Stream(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided `detail` message, if the backend sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_exposes_detail() {
        let err = ApiError::Status {
            status: 409,
            detail: Some("File X exists".to_string()),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.detail(), Some("File X exists"));
        assert_eq!(err.to_string(), "backend returned 409: File X exists");
    }

    #[test]
    fn test_status_error_without_detail() {
        let err = ApiError::Status { status: 500, detail: None };
        assert_eq!(err.detail(), None);
        assert_eq!(err.to_string(), "backend returned 500");
    }
}
