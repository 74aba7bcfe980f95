use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Transport failure, non-success HTTP status or a platform error code.
    #[error("remote error: {0}")]
    Remote(String),

    /// The response was fine but the data we need is not in it.
    #[error("not found: {0}")]
    NotFound(String),

    /// The media byte stream broke off mid-transfer.
    #[error("stream error: {0}")]
    Stream(String),

    /// The encoder could not be spawned or exited unsuccessfully.
    #[error("transcode error: {message}")]
    Transcode { message: String, diagnostics: String },

    /// The part's task died before reporting an outcome.
    #[error("aborted: {0}")]
    Aborted(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn remote_status(status: reqwest::StatusCode, url: &str) -> Self {
        Self::Remote(format!("HTTP {} from {}", status, url))
    }

    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            PipelineError::Transcode { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Remote(_) => "remote",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Stream(_) => "stream",
            PipelineError::Transcode { .. } => "transcode",
            PipelineError::Aborted(_) => "aborted",
            PipelineError::Io(_) => "io",
            PipelineError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Remote(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Remote(format!("malformed payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcode_carries_diagnostics() {
        let err = PipelineError::Transcode {
            message: "ffmpeg exited with status 1".into(),
            diagnostics: "invalid data".into(),
        };
        assert_eq!(err.diagnostics(), Some("invalid data"));
        assert_eq!(err.kind(), "transcode");
    }

    #[test]
    fn malformed_json_is_remote() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PipelineError = parse_err.into();
        assert!(matches!(err, PipelineError::Remote(_)));
        assert!(err.diagnostics().is_none());
    }

    #[test]
    fn remote_status_message() {
        let err = PipelineError::remote_status(reqwest::StatusCode::FORBIDDEN, "https://x/y");
        assert_eq!(err.to_string(), "remote error: HTTP 403 Forbidden from https://x/y");
    }
}
