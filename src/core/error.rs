use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    /// The exchange failed before a complete response was read.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// Set when the status line arrived but the body did not.
        status: Option<u16>,
        #[source]
        source: BoxError,
    },

    #[error("Unexpected status code {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        /// Status of the response whose body could not be decoded.
        status: u16,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Completion response contained no choices")]
    EmptyChoices,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn transport(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Transport {
            message: message.into(),
            status: None,
            source: source.into(),
        }
    }

    pub(crate) fn body_read(status: u16, source: impl Into<BoxError>) -> Self {
        Error::Transport {
            message: "Failed to read response body".to_string(),
            status: Some(status),
            source: source.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>, status: u16) -> Self {
        Error::MalformedResponse {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Best-known HTTP status for this error.
    ///
    /// `None` when the request never reached the server.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::MalformedResponse { status, .. } => Some(*status),
            Error::EmptyChoices => Some(200),
            Error::Transport { status, .. } => *status,
            Error::Configuration(_) => None,
        }
    }
}
