//! Errors raised while propagating cancellation to other hops.

use crate::token::TokenId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A remote cancellation target could not be reached.
    Unreachable { token: TokenId, reason: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable { token, reason } => {
                write!(f, "could not deliver cancellation of token {}: {}", token, reason)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
