//! Integration tests: descriptors through a dispatch table into a live registry.

use std::sync::Arc;
use std::time::Duration;

use neocancel::CancellationRegistry;
use neocancel::CancellationRuntime;
use neocancel::CancellationSources;
use neocancel::GrainCancellationToken;
use neocancel::RegistryConfig;
use neocancel::TokenId;
use neoinvoke::AliasComponent;
use neoinvoke::BaseDispatchType;
use neoinvoke::Call;
use neoinvoke::Catalog;
use neoinvoke::CompoundAlias;
use neoinvoke::DispatchFamily;
use neoinvoke::DispatchTable;
use neoinvoke::InvokeTarget;
use neoinvoke::TargetHolder;
use neoinvoke::Value;
use neoinvoke::emit;
use neoinvoke::register_cancellation_tokens;
use neoschema::InterfaceDescription;
use neoschema::MethodDecl;
use neoschema::SchemaConfig;
use neoschema::TypeRef;

fn family() -> DispatchFamily {
    DispatchFamily::new("grain")
        .bind(TypeRef::named("Task"), BaseDispatchType::new(TypeRef::named("TaskRequest")))
        .bind(TypeRef::unbound_shape("Task", 1), BaseDispatchType::new(TypeRef::unbound_shape("TaskRequest", 1)))
}

fn worker() -> InterfaceDescription {
    InterfaceDescription::new("IWorker")
        .with_method(
            MethodDecl::new("Compute", TypeRef::generic("Task", [TypeRef::named("int")]))
                .with_param("n", TypeRef::named("int"))
                .with_param("ct", TypeRef::named("CancellationToken")),
        )
        .with_method(
            MethodDecl::new("Supervise", TypeRef::named("Task"))
                .with_param("job", TypeRef::named("GrainCancellationToken")),
        )
}

fn alias_of(method_id: &str) -> CompoundAlias {
    CompoundAlias(vec![
        AliasComponent::literal("inv"),
        AliasComponent::Type(TypeRef::named("IWorker")),
        AliasComponent::literal(method_id),
    ])
}

/// Computes `n * 2` unless cancelled first; reports cancellation as `-1`.
struct Worker;

#[async_trait::async_trait]
impl InvokeTarget for Worker {
    async fn invoke(&self, call: Call<'_>) -> anyhow::Result<Value> {
        match call.method() {
            "Compute" => {
                let n = call.arguments[0].as_int().unwrap_or_default();
                let token = call.cancellation().cloned().unwrap_or_default();
                tokio::select! {
                    _ = token.cancelled() => Ok(Value::Int(-1)),
                    _ = tokio::time::sleep(Duration::from_secs(60)) => Ok(Value::Int(n * 2)),
                }
            }
            "Supervise" => Ok(Value::Unit),
            other => anyhow::bail!("unknown method {}", other),
        }
    }
}

struct Silo {
    registry: CancellationRegistry,
}

impl TargetHolder for Silo {
    fn target(&self) -> Option<Arc<dyn InvokeTarget>> {
        Some(Arc::new(Worker))
    }

    fn component(&self, _interface: &TypeRef) -> Option<Arc<dyn InvokeTarget>> {
        None
    }

    fn cancellation_runtime(&self) -> Option<Arc<dyn CancellationRuntime>> {
        Some(Arc::new(self.registry.clone()))
    }
}

fn table() -> DispatchTable {
    let mut catalog = Catalog::new(SchemaConfig::default());
    assert_eq!(catalog.add_interface(&worker(), &family()), 2);
    let mut table = DispatchTable::new();
    emit(&catalog, &mut table).expect("aliases are unique");
    table
}

// --- Test 1: Uncancelled Call Completes ---

#[tokio::test(start_paused = true)]
async fn test_call_completes() -> anyhow::Result<()> {
    let registry = CancellationRegistry::default();
    let table = table();

    let mut call = table.invocation(&alias_of("0")).expect("Compute is registered");
    call.set_argument(0, Value::Int(21))?;
    call.set_target(Arc::new(Silo { registry: registry.clone() }));

    assert_eq!(call.invoke().await?.as_int(), Some(42));
    Ok(())
}

// --- Test 2: Remote Cancel Reaches a Running Call ---

#[tokio::test(start_paused = true)]
async fn test_remote_cancel_reaches_running_call() -> anyhow::Result<()> {
    let registry = CancellationRegistry::new(RegistryConfig::new(Duration::from_secs(1)));
    let sweeper = registry.spawn_sweeper();
    let table = table();

    // Caller side: the token id travels with the arguments.
    let caller = table.invocation(&alias_of("0")).expect("Compute is registered");
    let token_id = caller.cancellation_token_id().expect("Compute is cancellable");

    // Callee side: rebuilt from the wire.
    let mut callee = table.invocation(&alias_of("0")).expect("Compute is registered");
    callee.set_argument(0, Value::Int(5))?;
    assert!(callee.set_cancellation_token_id(token_id));
    callee.set_target(Arc::new(Silo { registry: registry.clone() }));

    let remote: Arc<dyn CancellationSources> = Arc::new(registry.clone());
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        remote.cancel_invokable(token_id).await
    };
    let (result, cancelled) = tokio::join!(callee.invoke(), cancel);

    cancelled?;
    assert_eq!(result?.as_int(), Some(-1));
    assert_eq!(registry.is_cancelled(token_id), Some(true));

    // The released entry is reclaimed once it goes stale.
    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(registry.token_count(), 0);

    sweeper.shutdown().await;
    Ok(())
}

// --- Test 3: Cancel Sent Before the Call Arrives ---

#[tokio::test(start_paused = true)]
async fn test_cancel_before_call_arrives() -> anyhow::Result<()> {
    let registry = CancellationRegistry::default();
    let table = table();
    let token_id = TokenId::new();

    registry.cancel_invokable(token_id).await?;

    let mut callee = table.invocation(&alias_of("0")).expect("Compute is registered");
    callee.set_argument(0, Value::Int(5))?;
    callee.set_cancellation_token_id(token_id);
    callee.set_target(Arc::new(Silo { registry: registry.clone() }));

    assert_eq!(callee.invoke().await?.as_int(), Some(-1));
    Ok(())
}

// --- Test 4: Composite Tokens Chain Across Silos ---

#[tokio::test(start_paused = true)]
async fn test_composite_token_chains_across_silos() -> anyhow::Result<()> {
    let front = CancellationRegistry::default();
    let back = CancellationRegistry::default();
    let table = table();
    let id = TokenId::new();

    // The caller forwarded its token to the back silo.
    let caller_token = front.record_grain_token(id, false);
    caller_token.add_target(Arc::new(back.clone())).await?;

    // The back silo receives the token as an argument and swaps in its live one.
    let mut callee = table.invocation(&alias_of("1")).expect("Supervise is registered");
    callee.set_argument(0, Value::GrainToken(Arc::new(GrainCancellationToken::from_wire(id, false))))?;
    assert_eq!(register_cancellation_tokens(&back, &mut callee), 1);

    front.cancel_remote_token(id).await?;

    assert_eq!(back.is_grain_token_cancelled(id), Some(true));
    match callee.get_argument(0)? {
        Value::GrainToken(token) => assert!(token.is_cancellation_requested()),
        other => panic!("unexpected argument: {:?}", other),
    }
    Ok(())
}
