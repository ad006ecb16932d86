//! # Cancellation Seams
//!
//! Two traits separate the registry from its callers:
//!
//! - `CancellationSources` is the wire-facing contract. It is what a remote caller
//!   reaches through whatever RPC envelope carries it.
//! - `CancellationRuntime` is the local contract used by invocation dispatch to
//!   obtain a live signal for a call and release it afterwards.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::token::TokenId;

/// Remote entry points for cancellation.
///
/// Both operations are idempotent: repeating a call with the same id has the
/// same effect as making it once.
#[async_trait::async_trait]
pub trait CancellationSources: Send + Sync + 'static {
    /// Cancels a composite token, re-signaling any hops it was forwarded to.
    async fn cancel_remote_token(&self, token_id: TokenId) -> Result<()>;

    /// Cancels a simple per-call token.
    async fn cancel_invokable(&self, token_id: TokenId) -> Result<()>;
}

/// Local runtime component consulted by cancellable invocations.
pub trait CancellationRuntime: Send + Sync {
    /// Returns the live signal for `token_id`, creating it if needed.
    fn register_cancellable_token(&self, token_id: TokenId) -> CancellationToken;

    /// Requests cancellation of `token_id`.
    fn cancel(&self, token_id: TokenId);
}
