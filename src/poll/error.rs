use std::{error::Error, fmt};

/// Why a single tick produced no reading.
#[derive(Debug)]
pub enum PollError {
    Client(reqwest::Error),
    Transport(reqwest::Error),
    Status(u16),
    Json(serde_json::Error),
    NotAnObject,
    MissingField(&'static str),
    WrongType(&'static str),
    NotFinite(f64),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Client(err) => write!(f, "cannot build http client: {}", err),
            PollError::Transport(err) => write!(f, "request failed: {}", err),
            PollError::Status(code) => write!(f, "unexpected status {}", code),
            PollError::Json(err) => write!(f, "body is not valid json: {}", err),
            PollError::NotAnObject => write!(f, "body is not a json object"),
            PollError::MissingField(name) => write!(f, "field `{}` is missing", name),
            PollError::WrongType(name) => write!(f, "field `{}` is not a number", name),
            PollError::NotFinite(value) => write!(f, "temperature {} is not finite", value),
        }
    }
}

impl Error for PollError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PollError::Client(err) | PollError::Transport(err) => Some(err),
            PollError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        PollError::Transport(err)
    }
}

impl From<serde_json::Error> for PollError {
    fn from(err: serde_json::Error) -> Self {
        PollError::Json(err)
    }
}
