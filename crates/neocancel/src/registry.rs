//! # Cancellation Token Registry
//!
//! Two keyspaces of live cancellation handles: simple per-call tokens and
//! composite grain tokens. They are separate maps, so an id used for one kind can
//! never resolve to an entry of the other.
//!
//! Entries are created lazily by whichever arrives first, the registration or
//! the cancel. Every access refreshes the entry's last-touch time; the sweep
//! removes entries untouched for longer than the expiry window.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::sources::CancellationRuntime;
use crate::sources::CancellationSources;
use crate::token::GrainCancellationToken;
use crate::token::TokenId;

/// A registry row: a handle plus the time it was last touched.
struct Entry<T> {
    token: T,
    last_touched: Instant,
}

impl<T> Entry<T> {
    fn new(token: T) -> Self {
        Self { token, last_touched: Instant::now() }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    /// Entries touched after `now` was taken are never expired.
    fn is_expired(&self, expiry: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_touched) >= expiry
    }
}

pub(crate) struct Inner {
    config: RegistryConfig,
    tokens: DashMap<TokenId, Entry<CancellationToken>>,
    grain_tokens: DashMap<TokenId, Entry<Arc<GrainCancellationToken>>>,
}

impl Inner {
    pub(crate) fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Removes expired entries from both keyspaces; returns how many were removed.
    ///
    /// `retain` evaluates each entry under its shard's write lock, the same lock a
    /// touch takes, so an entry touched concurrently is seen with its new time.
    pub(crate) fn expire_tokens(&self) -> usize {
        let now = Instant::now();
        let expiry = self.config.expiry;

        let mut expired_tokens = 0;
        self.tokens.retain(|_, entry| {
            let keep = !entry.is_expired(expiry, now);
            expired_tokens += usize::from(!keep);
            keep
        });

        let mut expired_grain_tokens = 0;
        self.grain_tokens.retain(|_, entry| {
            let keep = !entry.is_expired(expiry, now);
            expired_grain_tokens += usize::from(!keep);
            keep
        });

        if expired_tokens + expired_grain_tokens > 0 {
            debug!(expired_tokens, expired_grain_tokens, "expired cancellation tokens");
        }
        expired_tokens + expired_grain_tokens
    }
}

/// Concurrent registry of cancellation handles.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct CancellationRegistry {
    pub(crate) inner: Arc<Inner>,
}

impl CancellationRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                tokens: DashMap::new(),
                grain_tokens: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Returns the simple token for `token_id`, creating it if absent.
    ///
    /// An existing entry is touched and returned as is. A new entry starts
    /// cancelled when `already_cancelled` is set.
    pub fn record_token(&self, token_id: TokenId, already_cancelled: bool) -> CancellationToken {
        match self.inner.tokens.entry(token_id) {
            MapEntry::Occupied(mut occupied) => {
                occupied.get_mut().touch();
                occupied.get().token.clone()
            }
            MapEntry::Vacant(vacant) => {
                let token = CancellationToken::new();
                if already_cancelled {
                    token.cancel();
                }
                vacant.insert(Entry::new(token.clone()));
                token
            }
        }
    }

    /// Cancels the simple token for `token_id`.
    ///
    /// An unknown id is recorded as already cancelled so that a registration
    /// arriving later still observes the cancel.
    pub fn cancel(&self, token_id: TokenId) {
        let (token, found) = match self.inner.tokens.entry(token_id) {
            MapEntry::Occupied(mut occupied) => {
                occupied.get_mut().touch();
                (occupied.get().token.clone(), true)
            }
            MapEntry::Vacant(vacant) => {
                let token = CancellationToken::new();
                vacant.insert(Entry::new(token.clone()));
                (token, false)
            }
        };

        if !found {
            warn!(token_id = %token_id, "received a cancel call for token, but the token was not found");
        }
        token.cancel();
    }

    /// Returns the composite token for `token_id`, creating it if absent.
    ///
    /// Used to swap a token that arrived over the wire for the registry's live one.
    pub fn record_grain_token(&self, token_id: TokenId, already_cancelled: bool) -> Arc<GrainCancellationToken> {
        match self.inner.grain_tokens.entry(token_id) {
            MapEntry::Occupied(mut occupied) => {
                occupied.get_mut().touch();
                occupied.get().token.clone()
            }
            MapEntry::Vacant(vacant) => {
                let token = Arc::new(GrainCancellationToken::from_wire(token_id, already_cancelled));
                vacant.insert(Entry::new(token.clone()));
                token
            }
        }
    }

    /// Cancels the composite token for `token_id` and re-signals its hops.
    ///
    /// Delivery failures are logged by the token, never returned: from the
    /// caller's side a cancel always succeeds.
    pub async fn cancel_grain_token(&self, token_id: TokenId) {
        let (token, found) = match self.inner.grain_tokens.entry(token_id) {
            MapEntry::Occupied(mut occupied) => {
                occupied.get_mut().touch();
                (occupied.get().token.clone(), true)
            }
            MapEntry::Vacant(vacant) => {
                let token = Arc::new(GrainCancellationToken::from_wire(token_id, true));
                vacant.insert(Entry::new(token.clone()));
                (token, false)
            }
        };

        if !found {
            warn!(token_id = %token_id, "received a cancel call for grain token, but the token was not found");
            return;
        }
        let _ = token.cancel().await;
    }

    /// Removes every entry untouched for longer than the expiry window.
    pub fn expire_tokens(&self) -> usize {
        self.inner.expire_tokens()
    }

    /// The cancellation state of a simple token, if one is registered.
    pub fn is_cancelled(&self, token_id: TokenId) -> Option<bool> {
        self.inner.tokens.get(&token_id).map(|e| e.token.is_cancelled())
    }

    /// The cancellation state of a composite token, if one is registered.
    pub fn is_grain_token_cancelled(&self, token_id: TokenId) -> Option<bool> {
        self.inner.grain_tokens.get(&token_id).map(|e| e.token.is_cancellation_requested())
    }

    pub fn token_count(&self) -> usize {
        self.inner.tokens.len()
    }

    pub fn grain_token_count(&self) -> usize {
        self.inner.grain_tokens.len()
    }
}

impl Default for CancellationRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl CancellationRuntime for CancellationRegistry {
    fn register_cancellable_token(&self, token_id: TokenId) -> CancellationToken {
        self.record_token(token_id, false)
    }

    fn cancel(&self, token_id: TokenId) {
        CancellationRegistry::cancel(self, token_id)
    }
}

#[async_trait::async_trait]
impl CancellationSources for CancellationRegistry {
    async fn cancel_remote_token(&self, token_id: TokenId) -> Result<()> {
        self.cancel_grain_token(token_id).await;
        Ok(())
    }

    async fn cancel_invokable(&self, token_id: TokenId) -> Result<()> {
        CancellationRegistry::cancel(self, token_id);
        Ok(())
    }
}
