//! # Token Identities and Composite Tokens
//!
//! A `TokenId` joins a caller's cancellation request to the call it targets.
//! A `GrainCancellationToken` is the composite kind: besides its own state it
//! remembers every remote hop it was forwarded to, and re-signals them on cancel.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::sources::CancellationSources;

/// Opaque 128-bit token identifier.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenId(pub Uuid);

impl TokenId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TokenId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cancellation token that can be re-signaled across call hops.
///
/// Every hop the token is forwarded to is recorded with `add_target`; `cancel`
/// signals the local state and then asks each of those hops to cancel its own
/// copy, which may in turn forward further.
///
/// Hops are signaled at most once, on the first transition to cancelled. Hops
/// that forward the token back to each other therefore terminate.
pub struct GrainCancellationToken {
    id: TokenId,
    source: CancellationToken,
    /// Set by the first `cancel`; later calls do not re-signal hops.
    cancelled: AtomicBool,
    targets: Mutex<Vec<Arc<dyn CancellationSources>>>,
}

impl GrainCancellationToken {
    pub fn new(id: TokenId) -> Self {
        Self::from_wire(id, false)
    }

    /// Rebuilds a token from what travels on the wire: its id and whether it was
    /// already cancelled. The result knows no targets yet.
    pub fn from_wire(id: TokenId, cancellation_requested: bool) -> Self {
        let source = CancellationToken::new();
        if cancellation_requested {
            source.cancel();
        }
        Self {
            id,
            source,
            cancelled: AtomicBool::new(cancellation_requested),
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.source.is_cancelled()
    }

    /// A handle observing this token's state.
    pub fn token(&self) -> CancellationToken {
        self.source.clone()
    }

    /// Records a hop this token was forwarded to.
    ///
    /// A hop added after the token was cancelled is signaled right away.
    pub async fn add_target(&self, target: Arc<dyn CancellationSources>) -> Result<()> {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).push(target.clone());
        if !self.cancelled.load(Ordering::SeqCst) {
            return Ok(());
        }
        target.cancel_remote_token(self.id).await.inspect_err(|err| {
            warn!(token_id = %self.id, error = %err, "failed to propagate cancellation");
        })
    }

    pub fn target_count(&self) -> usize {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Cancels locally, then re-signals every recorded hop concurrently.
    ///
    /// Local cancellation always takes effect. Only the first call signals the
    /// hops; repeated calls return `Ok(())`. Returns the first delivery failure,
    /// after every hop has been attempted.
    pub async fn cancel(&self) -> Result<()> {
        self.source.cancel();
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let targets: Vec<_> = self.targets.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let id = self.id;
        let results = join_all(targets.iter().map(|t| t.cancel_remote_token(id))).await;

        let mut first_error = None;
        for err in results.into_iter().filter_map(|r| r.err()) {
            warn!(token_id = %id, error = %err, "failed to propagate cancellation");
            first_error.get_or_insert(err);
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for GrainCancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrainCancellationToken")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancellation_requested())
            .field("targets", &self.target_count())
            .finish()
    }
}
