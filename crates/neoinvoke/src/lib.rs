//! # Neoinvoke
//!
//! Describes remotely invocable interface methods and dispatches calls to them.
//!
//! For every method of an interface, `build` derives an `InvocationDescriptor`:
//! its argument layout, the base dispatch type chosen by its return type, its
//! cancellation wiring and a structurally unique alias. A `Backend` turns
//! descriptors into something executable; `DispatchTable` and `Invocation` are
//! the in-crate interpreter.
//!
//! ## Philosophy
//!
//! - **Pure description**: Building descriptors is a synchronous function of
//!   declarations and `SchemaConfig`. No discovery, no emission.
//! - **Unique aliases**: Interface, extension owner and method id all take part
//!   in the alias, so overloads and extensions never collide silently.
//! - **Release on every exit**: A cancellable call forwards a final cancel for its
//!   token when dispatch ends, including on failure and when the call is dropped.

pub mod alias;
pub mod backend;
pub mod descriptor;
pub mod error;
pub mod family;
pub mod interface;
pub mod invocation;


pub use alias::AliasComponent;
pub use alias::CompoundAlias;
pub use backend::Backend;
pub use backend::DispatchTable;
pub use backend::emit;
pub use descriptor::InvocationDescriptor;
pub use descriptor::MethodKey;
pub use descriptor::SlotDescriptor;
pub use descriptor::SlotRole;
pub use descriptor::TargetAccess;
pub use descriptor::build;
pub use error::Error;
pub use error::Result;
pub use family::BaseDispatchType;
pub use family::BaseTypeBinding;
pub use family::DispatchFamily;
pub use interface::Catalog;
pub use interface::describe_interface;
pub use invocation::BaseDispose;
pub use invocation::Call;
pub use invocation::Invocation;
pub use invocation::InvocationState;
pub use invocation::InvokeTarget;
pub use invocation::TargetHolder;
pub use invocation::Value;
pub use invocation::register_cancellation_tokens;
