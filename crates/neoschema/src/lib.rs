//! # Neoschema
//!
//! Derives the versionable wire schema of an application type: which of its
//! members are serialized, and the numeric identity each one carries on the wire.
//!
//! ## Philosophy
//!
//! - **Descriptions, not reflection**: Resolution runs over plain `TypeDescription`
//!   values. Whatever discovers declarations (a parser, a proc macro, a hand-written
//!   table) only has to fill them in.
//! - **Ids are forever**: Once a member id appears in serialized data it must keep
//!   meaning the same member. Resolution is deterministic for a given description
//!   and never reassigns an explicitly declared id.
//! - **Explicit configuration**: Recognized annotations and the auto-id switch live
//!   in `SchemaConfig`, passed to every call.

pub mod config;
pub mod desc;
pub mod error;
pub mod member;

#[cfg(test)]
mod tests;

pub use config::SchemaConfig;
pub use desc::Annotation;
pub use desc::AnnotationValue;
pub use desc::InterfaceDescription;
pub use desc::MemberDecl;
pub use desc::MemberDeclKind;
pub use desc::MethodDecl;
pub use desc::ParameterDecl;
pub use desc::TypeDescription;
pub use desc::TypeRef;
pub use desc::TypeRole;
pub use error::Error;
pub use error::Result;
pub use member::MemberDescriptor;
pub use member::MemberKind;
pub use member::resolve;
pub use member::validate_dispatch_container;
