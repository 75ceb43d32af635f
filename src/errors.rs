use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Overpass request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error("Malformed buffer value {value:?} on feature {}", .feature.as_deref().unwrap_or("<unknown>"))]
    MalformedBufferValue {
        value: String,
        feature: Option<String>,
    },

    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Attaches the id of the offending feature to a buffer parse error. Other errors pass through.
    pub fn for_feature(self, feature_id: &str) -> Self {
        match self {
            Error::MalformedBufferValue { value, .. } => Error::MalformedBufferValue {
                value,
                feature: Some(feature_id.to_string()),
            },
            other => other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(value: ureq::Error) -> Self {
        Error::Http(Box::new(value))
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Message(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Message(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
