//! # Neocancel
//!
//! Keeps the cancellation state of in-flight calls, keyed by a caller-chosen
//! token id, so a cancel request and the call it targets can arrive in either order.
//!
//! ## Philosophy
//!
//! - **Commutative**: `cancel` before `record_token` ends in the same state as the
//!   reverse. A cancel for an unknown id is recorded, not rejected.
//! - **Atomic per key**: Every mutation is a single DashMap entry operation, so
//!   concurrent callers resolving one id converge on one entry.
//! - **Bounded presence**: Entries are reclaimed by a background sweep once
//!   untouched past the expiry window. Cancellation itself is permanent.

pub mod config;
pub mod error;
pub mod registry;
pub mod sources;
pub mod sweeper;
pub mod token;


pub use config::RegistryConfig;
pub use error::Error;
pub use error::Result;
pub use registry::CancellationRegistry;
pub use sources::CancellationRuntime;
pub use sources::CancellationSources;
pub use sweeper::Sweeper;
pub use token::GrainCancellationToken;
pub use token::TokenId;

pub use tokio_util::sync::CancellationToken;
