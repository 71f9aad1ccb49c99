// Error module: every failure of an upload is normalized into a single
// `ClientError` so screens only ever have to show `err.to_string()`.

use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Fixed message shown when a request never got a response.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error: Please check your internet connection";

/// Normalized upload failure, tagged by cause.
///
/// `action` is the verb of the flow that failed ("Upload" for blood tests,
/// "Analysis" for barcode scans) and prefixes the user-facing message.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("{action} failed: {message}")]
    Server {
        action: &'static str,
        status: u16,
        message: String,
    },

    /// The request was sent but no response came back
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network {
        #[source]
        source: reqwest::Error,
    },

    /// The server answered 2xx but the body is not the configured shape
    #[error("{action} failed: malformed response from server ({reason})")]
    MalformedResponse {
        action: &'static str,
        reason: String,
    },

    /// Anything else, collapsed to a generic message
    #[error("{action} failed: Please try again")]
    Unexpected {
        action: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Invalid client configuration, raised before any request is made
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic failure, keeping the underlying cause as `source`
    pub fn unexpected(
        action: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::Unexpected {
            action,
            source: source.into(),
        }
    }

    /// HTTP status reported by the server, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if no response was received
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if a 2xx body failed shape validation
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_message_uses_action_prefix() {
        let err = ClientError::Server {
            action: "Upload",
            status: 500,
            message: "bad image".into(),
        };
        assert_eq!(err.to_string(), "Upload failed: bad image");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn unexpected_error_hides_its_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ClientError::unexpected("Analysis", io);
        assert_eq!(err.to_string(), "Analysis failed: Please try again");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status(), None);
    }
}
