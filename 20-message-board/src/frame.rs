//! Relay wire format: one UTF-8 datagram `"<username>:<message>"`.
//!
//! Decoding splits at the first delimiter, so a message may contain `:`
//! but a username may not. `encode` refuses usernames that would make the
//! frame ambiguous.

use std::fmt;

pub const DELIMITER: char = ':';

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_FRAME_LEN: usize = 65_507;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    UsernameContainsDelimiter,
    TooLarge(usize),
    NotUtf8,
    MissingDelimiter,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsernameContainsDelimiter => {
                write!(f, "username must not contain '{DELIMITER}'")
            }
            Self::TooLarge(len) => {
                write!(f, "frame of {len} bytes exceeds {MAX_FRAME_LEN} bytes")
            }
            Self::NotUtf8 => write!(f, "frame is not valid UTF-8"),
            Self::MissingDelimiter => write!(f, "frame has no '{DELIMITER}' delimiter"),
        }
    }
}

impl std::error::Error for FrameError {}

pub fn encode(username: &str, message: &str) -> Result<Vec<u8>, FrameError> {
    if username.contains(DELIMITER) {
        return Err(FrameError::UsernameContainsDelimiter);
    }

    let frame = format!("{username}{DELIMITER}{message}").into_bytes();
    if frame.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(frame.len()));
    }
    Ok(frame)
}

pub fn decode(datagram: &[u8]) -> Result<(String, String), FrameError> {
    let text = std::str::from_utf8(datagram).map_err(|_| FrameError::NotUtf8)?;
    let (username, message) = text
        .split_once(DELIMITER)
        .ok_or(FrameError::MissingDelimiter)?;
    Ok((username.to_string(), message.to_string()))
}
