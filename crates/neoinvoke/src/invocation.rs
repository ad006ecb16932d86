//! # Invocation
//!
//! The direct interpreter of an `InvocationDescriptor`: one instance per call,
//! holding the call's arguments and dispatching it to a live target.
//!
//! ## Lifecycle
//!
//! `Constructed → Dispatching → Completed | Faulted`. Failing to find arguments
//! or a target leaves the instance `Constructed`; nothing was dispatched.
//!
//! A cancellable invocation registers its token id with the holder's
//! cancellation runtime for the duration of the dispatch, and always forwards a
//! final cancel for that id when the dispatch ends, however it ends.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use neocancel::CancellationRegistry;
use neocancel::CancellationRuntime;
use neocancel::GrainCancellationToken;
use neocancel::TokenId;
use neoschema::TypeRef;

use crate::descriptor::InvocationDescriptor;
use crate::descriptor::TargetAccess;
use crate::error::Error;
use crate::error::Result;

/// A dynamically typed argument or result.
#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// A live cancellation signal, passed in the cancellation parameter's position.
    CancellationToken(CancellationToken),
    /// A composite token carried as an ordinary argument.
    GrainToken(Arc<GrainCancellationToken>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_cancellation_token(&self) -> Option<&CancellationToken> {
        match self {
            Self::CancellationToken(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// A call as seen by its target.
pub struct Call<'a> {
    pub descriptor: &'a InvocationDescriptor,
    /// Arguments in declared parameter order; the cancellation parameter, if
    /// any, holds the live signal.
    pub arguments: Vec<Value>,
}

impl Call<'_> {
    pub fn method(&self) -> &str {
        &self.descriptor.method_name
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        let index = self.descriptor.cancellation_parameter_index?;
        self.arguments.get(index)?.as_cancellation_token()
    }
}

/// An object invocations are dispatched to.
#[async_trait::async_trait]
pub trait InvokeTarget: Send + Sync + 'static {
    async fn invoke(&self, call: Call<'_>) -> anyhow::Result<Value>;
}

/// Resolves the live dispatch target and its runtime services at call time.
pub trait TargetHolder: Send + Sync + 'static {
    fn target(&self) -> Option<Arc<dyn InvokeTarget>>;

    /// The component implementing the extension interface `interface`.
    fn component(&self, interface: &TypeRef) -> Option<Arc<dyn InvokeTarget>>;

    fn cancellation_runtime(&self) -> Option<Arc<dyn CancellationRuntime>>;
}

/// Disposal routine of a base dispatch type.
pub trait BaseDispose: Send + Sync + 'static {
    fn dispose(&self, descriptor: &InvocationDescriptor);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationState {
    Constructed,
    Dispatching,
    Completed,
    Faulted,
}

/// Forwards the final cancel for a token id when dropped.
struct CancelOnExit {
    runtime: Option<Arc<dyn CancellationRuntime>>,
    token_id: TokenId,
}

impl Drop for CancelOnExit {
    fn drop(&mut self) {
        if let Some(runtime) = &self.runtime {
            runtime.cancel(self.token_id);
        }
    }
}

pub struct Invocation {
    descriptor: Arc<InvocationDescriptor>,
    arguments: Vec<Option<Value>>,
    holder: Option<Arc<dyn TargetHolder>>,
    token_id: Option<TokenId>,
    base_dispose: Option<Arc<dyn BaseDispose>>,
    state: InvocationState,
}

impl Invocation {
    /// A new, empty invocation. Cancellable descriptors get a fresh token id.
    pub fn new(descriptor: Arc<InvocationDescriptor>) -> Self {
        let token_id = descriptor.is_cancellable.then(TokenId::new);
        Self {
            arguments: vec![None; descriptor.argument_count()],
            descriptor,
            holder: None,
            token_id,
            base_dispose: None,
            state: InvocationState::Constructed,
        }
    }

    pub fn descriptor(&self) -> &InvocationDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn get_argument(&self, index: usize) -> Result<&Value> {
        match self.arguments.get(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(self.missing_argument(index)),
            None => Err(Error::ArgumentOutOfRange { index, count: self.arguments.len() }),
        }
    }

    pub fn set_argument(&mut self, index: usize, value: Value) -> Result<()> {
        let count = self.arguments.len();
        let slot = self.arguments.get_mut(index).ok_or(Error::ArgumentOutOfRange { index, count })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn set_target(&mut self, holder: Arc<dyn TargetHolder>) {
        self.holder = Some(holder);
    }

    pub fn with_base_dispose(mut self, hook: Arc<dyn BaseDispose>) -> Self {
        self.base_dispose = Some(hook);
        self
    }

    /// The token id of a cancellable invocation.
    pub fn cancellation_token_id(&self) -> Option<TokenId> {
        self.token_id
    }

    /// Adopts a token id received over the wire. Ignored for non-cancellable
    /// invocations; returns whether it was applied.
    pub fn set_cancellation_token_id(&mut self, token_id: TokenId) -> bool {
        if self.token_id.is_none() {
            return false;
        }
        self.token_id = Some(token_id);
        true
    }

    /// Dispatches the call to the holder's target.
    pub async fn invoke(&mut self) -> Result<Value> {
        if self.state != InvocationState::Constructed {
            return Err(Error::AlreadyDispatched { method: self.descriptor.activity_name.clone() });
        }

        let mut arguments = Vec::with_capacity(self.arguments.len() + 1);
        for index in 0..self.arguments.len() {
            arguments.push(self.get_argument(index)?.clone());
        }

        let not_found = || Error::TargetNotFound { method: self.descriptor.activity_name.clone() };
        let holder = self.holder.clone().ok_or_else(not_found)?;
        let target = match self.descriptor.target_access {
            TargetAccess::Target => holder.target(),
            TargetAccess::Component => holder.component(&self.descriptor.interface_type),
        }
        .ok_or_else(not_found)?;

        trace!(method = %self.descriptor.activity_name, token_id = ?self.token_id, "dispatching");
        self.state = InvocationState::Dispatching;

        let result = match self.token_id {
            None => target.invoke(Call { descriptor: &self.descriptor, arguments }).await,
            Some(token_id) => {
                let runtime = holder.cancellation_runtime();
                let token = match &runtime {
                    Some(runtime) => runtime.register_cancellable_token(token_id),
                    None => CancellationToken::new(),
                };
                let _release = CancelOnExit { runtime, token_id };

                let index = self.descriptor.cancellation_parameter_index.unwrap_or(arguments.len());
                arguments.insert(index.min(arguments.len()), Value::CancellationToken(token));
                target.invoke(Call { descriptor: &self.descriptor, arguments }).await
            }
        };

        match result {
            Ok(value) => {
                self.state = InvocationState::Completed;
                Ok(value)
            }
            Err(err) => {
                debug!(method = %self.descriptor.activity_name, error = %err, "invocation faulted");
                self.state = InvocationState::Faulted;
                Err(Error::Faulted(err))
            }
        }
    }

    /// Releases held arguments and the holder, then runs the base type's own
    /// disposal when it has one.
    pub fn dispose(&mut self) {
        for slot in &mut self.arguments {
            *slot = None;
        }
        self.holder = None;
        if self.descriptor.base.has_dispose {
            if let Some(hook) = &self.base_dispose {
                hook.dispose(&self.descriptor);
            }
        }
    }

    fn missing_argument(&self, index: usize) -> Error {
        let name = self.descriptor.argument_fields.get(index).map(|f| f.name.clone()).unwrap_or_default();
        Error::MissingArgument { index, name }
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.descriptor.activity_name)
            .field("state", &self.state)
            .field("token_id", &self.token_id)
            .finish()
    }
}

/// Swaps composite tokens that arrived as arguments for the registry's live ones.
///
/// A token rebuilt from the wire knows nothing of the hops it was forwarded to;
/// the registry's token for the same id does. Returns the number swapped.
pub fn register_cancellation_tokens(registry: &CancellationRegistry, invocation: &mut Invocation) -> usize {
    let mut swapped = 0;
    for value in invocation.arguments.iter_mut().flatten() {
        if let Value::GrainToken(token) = value {
            *token = registry.record_grain_token(token.id(), token.is_cancellation_requested());
            swapped += 1;
        }
    }
    swapped
}
