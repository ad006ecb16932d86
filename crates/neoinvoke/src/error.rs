//! # Invocation Errors
//!
//! Two families share one enum. Declaration errors are found while describing a
//! method and are fatal to that method only. Dispatch errors are raised by an
//! `Invocation` at call time.

use neoschema::TypeRef;

#[derive(Debug)]
pub enum Error {
    /// The method's return type matches no base type of its dispatch family.
    UnsupportedReturnType { interface: String, method: String, return_type: TypeRef },
    /// A method may carry at most one cancellation parameter.
    MultipleCancellationTokenParameters { interface: String, method: String },
    /// Two descriptors in one catalog produced the same alias.
    DuplicateAlias { alias: String, first: String, second: String },
    /// An annotation is present but its value is unusable.
    InvalidAnnotation { interface: String, method: String, annotation: String, value: String },
    /// The interface failed schema validation.
    Schema(neoschema::Error),

    /// Argument index past the end of the argument list.
    ArgumentOutOfRange { index: usize, count: usize },
    /// An argument was never set before dispatch.
    MissingArgument { index: usize, name: String },
    /// The holder has no target (or component) to dispatch to.
    TargetNotFound { method: String },
    /// An invocation instance dispatches at most once.
    AlreadyDispatched { method: String },
    /// The target itself failed.
    Faulted(anyhow::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedReturnType { interface, method, return_type } => write!(
                f,
                "method '{}.{}' returns '{}', which matches no known dispatch base type",
                interface, method, return_type
            ),
            Self::MultipleCancellationTokenParameters { interface, method } => write!(
                f,
                "method '{}.{}' has more than one cancellation token parameter",
                interface, method
            ),
            Self::DuplicateAlias { alias, first, second } => {
                write!(f, "alias '{}' is produced by both '{}' and '{}'", alias, first, second)
            }
            Self::InvalidAnnotation { interface, method, annotation, value } => write!(
                f,
                "method '{}.{}' has an invalid '{}' annotation: {}",
                interface, method, annotation, value
            ),
            Self::Schema(e) => write!(f, "{}", e),
            Self::ArgumentOutOfRange { index, count } => {
                write!(f, "argument index {} is out of range for {} arguments", index, count)
            }
            Self::MissingArgument { index, name } => write!(f, "argument {} ('{}') was not set", index, name),
            Self::TargetNotFound { method } => write!(f, "no dispatch target for '{}'", method),
            Self::AlreadyDispatched { method } => write!(f, "invocation of '{}' was already dispatched", method),
            Self::Faulted(e) => write!(f, "invocation faulted: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Faulted(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<neoschema::Error> for Error {
    fn from(e: neoschema::Error) -> Self {
        Self::Schema(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
