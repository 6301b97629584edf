//! Error types for the video API client.
//!
//! # Design
//! A single enum covers every failure a call can produce. Validation and
//! configuration problems are detected before a request is built; `Remote`
//! carries the raw status and body of any response outside the expected
//! status range so callers can inspect the service's own error document.

/// Errors returned by `VideoClient` build/parse methods and by transports.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A credential field is empty or could not be loaded.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A request parameter or video layout violates a local constraint.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request payload could not be serialized.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status the operation does not accept.
    #[error("HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The response body does not match the expected shape.
    #[error("decoding error: {0}")]
    Decoding(String),
}

impl ApiError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding(msg.into())
    }

    /// HTTP status of a `Remote` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(ApiError::configuration("x").to_string().starts_with("configuration error:"));
        assert!(ApiError::validation("x").to_string().starts_with("validation error:"));
        assert!(ApiError::encoding("x").to_string().starts_with("encoding error:"));
        assert!(ApiError::transport("x").to_string().starts_with("transport error:"));
        assert!(ApiError::decoding("x").to_string().starts_with("decoding error:"));
    }

    #[test]
    fn remote_error_carries_status_and_body() {
        let err = ApiError::Remote {
            status: 404,
            body: r#"{"code":20404}"#.to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), r#"HTTP 404: {"code":20404}"#);
    }

    #[test]
    fn non_remote_errors_have_no_status() {
        assert_eq!(ApiError::validation("bad").status(), None);
        assert!(!ApiError::decoding("bad").is_not_found());
    }
}
