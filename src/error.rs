use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more required settings are empty. Lists every offending name.
    #[error("Missing configuration: {}", missing.join(", "))]
    Config { missing: Vec<String> },

    /// The platform refused to issue an access token.
    #[error("Token request failed: {0}")]
    Token(String),

    /// Network failure, timeout, or a request that could not be built.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response, after the single re-authentication where it applies.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// The platform answered with a body we could not make sense of.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// HTTP status code for [`Error::Http`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
