//! Parse errors for the textual forms of the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid account identifier: {0:?}")]
    InvalidAccount(String),

    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}
