//! # Declaration Errors
//!
//! Failures found while resolving a single type. Each one names the offending
//! type and member so it can be reported as a build diagnostic. An error here is
//! fatal to that type only.

/// Schema declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A dispatch container declares a member shape it may not carry (a data property).
    DuplicateMemberAnnotation { type_name: String, member: String },
    /// Two members of the same kind resolved to the same wire id.
    DuplicateMemberId { type_name: String, id: u16, first: String, second: String },
    /// An identity annotation without a value, or with a value outside `u16`.
    InvalidIdAnnotation { type_name: String, member: String, value: String },
    /// Automatic id assignment ran past `u16::MAX`.
    IdSpaceExhausted { type_name: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateMemberAnnotation { type_name, member } => write!(
                f,
                "type '{}' is a dispatch container but declares data property '{}'; dispatch containers cannot contain properties",
                type_name, member
            ),
            Self::DuplicateMemberId { type_name, id, first, second } => write!(
                f,
                "type '{}' assigns id {} to both '{}' and '{}'",
                type_name, id, first, second
            ),
            Self::InvalidIdAnnotation { type_name, member, value } => write!(
                f,
                "member '{}' of type '{}' has an invalid id annotation: {}",
                member, type_name, value
            ),
            Self::IdSpaceExhausted { type_name } => {
                write!(f, "type '{}' has more members than there are wire ids", type_name)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
