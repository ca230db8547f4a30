use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::frame::FrameError;

/// Why a form submission was refused. Every variant is the client's fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    NotUtf8,
    MalformedPair(String),
    MalformedEncoding(String),
    MissingField(&'static str),
    DuplicateField(String),
    UnexpectedField(String),
    Frame(FrameError),
}

impl SubmitError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Frame(FrameError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUtf8 => write!(f, "form body is not valid UTF-8"),
            Self::MalformedPair(pair) => write!(f, "malformed form pair '{pair}'"),
            Self::MalformedEncoding(raw) => write!(f, "malformed percent-encoding in '{raw}'"),
            Self::MissingField(name) => write!(f, "missing form field '{name}'"),
            Self::DuplicateField(name) => write!(f, "form field '{name}' given more than once"),
            Self::UnexpectedField(name) => write!(f, "unexpected form field '{name}'"),
            Self::Frame(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<FrameError> for SubmitError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
