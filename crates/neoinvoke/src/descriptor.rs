//! # Invocation Descriptors
//!
//! The backend-agnostic description of one remotely invocable method: how its
//! arguments are laid out, which base type it extends, whether it is cancellable,
//! and the alias it is registered under.
//!
//! ## Layout
//!
//! - Argument slots take wire ids `0..n` over the parameters, skipping the
//!   cancellation parameter.
//! - Two runtime-only slots follow: the target holder and the method handle. They
//!   have no wire id.
//! - A cancellable method adds one more wire slot, id `n`, holding the token id.
//!   The id itself is generated per invocation instance, not here.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use neoschema::InterfaceDescription;
use neoschema::MemberDescriptor;
use neoschema::MethodDecl;
use neoschema::SchemaConfig;
use neoschema::TypeRef;

use crate::alias::AliasComponent;
use crate::alias::CompoundAlias;
use crate::alias::INVOKABLE_TAG;
use crate::error::Error;
use crate::error::Result;
use crate::family::BaseDispatchType;
use crate::family::DispatchFamily;

/// Identifies a method independent of any call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodKey {
    pub interface: String,
    pub method: String,
    /// Declared parameter types, cancellation parameter included.
    pub signature: Vec<TypeRef>,
    /// Number of the method's own type parameters.
    pub generic_arity: usize,
}

impl std::fmt::Display for MethodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.interface, self.method)?;
        if self.generic_arity > 0 {
            write!(f, "`{}", self.generic_arity)?;
        }
        write!(f, "(")?;
        for (i, ty) in self.signature.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}

/// What a slot of the generated object holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotRole {
    /// A method argument; `parameter_index` is its position in the declared parameter list.
    Argument { parameter_index: usize },
    /// The object that resolves the dispatch target at call time.
    Holder,
    /// Cached handle to the method being invoked.
    MethodInfo,
    /// The token id joining this call to a cancellation registry entry.
    CancellableTokenId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub role: SlotRole,
    /// Wire id; `None` for runtime-only slots.
    pub id: Option<u16>,
}

impl SlotDescriptor {
    pub fn is_serializable(&self) -> bool {
        self.id.is_some()
    }
}

/// How the dispatch target is found from the holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetAccess {
    /// The holder's target implements the method.
    Target,
    /// The method lives on a component attached to the target.
    Component,
}

/// Everything a backend needs to produce a dispatchable call object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationDescriptor {
    pub key: MethodKey,
    /// Ordinal of the method within its interface.
    pub generated_id: u32,
    /// The declared alias, or the generated id.
    pub method_id: String,
    pub generated_type_name: String,
    pub family: String,
    pub base: BaseDispatchType,
    pub argument_fields: Vec<MemberDescriptor>,
    pub slots: Vec<SlotDescriptor>,
    pub cancellation_parameter_index: Option<usize>,
    pub is_cancellable: bool,
    pub alias_components: CompoundAlias,
    /// Further aliases the descriptor is reachable under.
    pub additional_aliases: Vec<CompoundAlias>,
    /// The interface as seen by the dispatcher; the component key for extensions.
    pub interface_type: TypeRef,
    /// Interface name for display; the interface alias when one is declared.
    pub interface_name: String,
    pub method_name: String,
    pub activity_name: String,
    pub response_timeout: Option<Duration>,
    /// Interface type parameters followed by the method's own.
    pub type_parameters: Vec<String>,
    pub target_access: TargetAccess,
    pub return_type: TypeRef,
}

impl InvocationDescriptor {
    /// Arguments carried on the wire, cancellation parameter excluded.
    pub fn argument_count(&self) -> usize {
        self.argument_fields.len()
    }

    pub fn generic_arity(&self) -> usize {
        self.type_parameters.len()
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_void()
    }

    /// The wire id of the token id slot, for cancellable methods.
    pub fn cancellation_token_field_id(&self) -> Option<u16> {
        self.slots.iter().find(|s| s.role == SlotRole::CancellableTokenId).and_then(|s| s.id)
    }

    /// Primary alias followed by the additional ones.
    pub fn aliases(&self) -> impl Iterator<Item = &CompoundAlias> {
        std::iter::once(&self.alias_components).chain(self.additional_aliases.iter())
    }
}

/// Builds the descriptor for `method` of `interface` in `family`.
///
/// `generated_id` is the method's ordinal among the interface's methods.
pub fn build(
    interface: &InterfaceDescription,
    method: &MethodDecl,
    family: &DispatchFamily,
    config: &SchemaConfig,
    generated_id: u32,
) -> Result<InvocationDescriptor> {
    let base = family.match_return_type(&method.return_type).ok_or_else(|| Error::UnsupportedReturnType {
        interface: interface.name.clone(),
        method: method.name.clone(),
        return_type: method.return_type.clone(),
    })?;

    let cancellation_parameter_index = cancellation_parameter(interface, method, config)?;
    let argument_fields = argument_fields(method, cancellation_parameter_index)?;
    let token_field_id = match cancellation_parameter_index {
        Some(_) => Some(wire_id(argument_fields.len(), method)?),
        None => None,
    };
    let slots = slots(&argument_fields, cancellation_parameter_index, token_field_id, method, config);

    let declared_alias = config.alias_of(&method.annotations);
    let method_id = declared_alias.map_or_else(|| generated_id.to_string(), str::to_string);

    let interface_type = unbound_type(&interface.name, interface.type_parameters.len());
    let interface_name = config.alias_of(&interface.annotations).unwrap_or(&interface.name).to_string();

    let alias_prefix = alias_prefix(family, &interface_type, method);
    let alias_components = alias_prefix.clone().with(AliasComponent::Literal(method_id.clone()));
    let mut additional_aliases = Vec::new();
    if declared_alias.is_some() {
        additional_aliases.push(alias_prefix.with(AliasComponent::Literal(generated_id.to_string())));
    }

    let response_timeout = match config.response_timeout_of(&method.annotations) {
        Some(Ok(timeout)) => Some(timeout),
        Some(Err(value)) => {
            return Err(Error::InvalidAnnotation {
                interface: interface.name.clone(),
                method: method.name.clone(),
                annotation: config.response_timeout_annotation.clone(),
                value,
            });
        }
        None => None,
    };

    let type_parameters: Vec<String> =
        interface.type_parameters.iter().chain(method.type_parameters.iter()).cloned().collect();

    Ok(InvocationDescriptor {
        key: MethodKey {
            interface: interface.name.clone(),
            method: method.name.clone(),
            signature: method.parameters.iter().map(|p| p.ty.clone()).collect(),
            generic_arity: method.type_parameters.len(),
        },
        generated_id,
        generated_type_name: generated_type_name(&interface.name, &family.key, &method_id, type_parameters.len()),
        method_id,
        family: family.key.clone(),
        base,
        is_cancellable: cancellation_parameter_index.is_some(),
        argument_fields,
        slots,
        cancellation_parameter_index,
        alias_components,
        additional_aliases,
        activity_name: format!("{}/{}", interface_name, method.name),
        interface_type,
        interface_name,
        method_name: method.name.clone(),
        response_timeout,
        type_parameters,
        target_access: if family.is_extension { TargetAccess::Component } else { TargetAccess::Target },
        return_type: method.return_type.clone(),
    })
}

fn cancellation_parameter(
    interface: &InterfaceDescription,
    method: &MethodDecl,
    config: &SchemaConfig,
) -> Result<Option<usize>> {
    let mut found = None;
    for (index, param) in method.parameters.iter().enumerate() {
        if param.ty != config.cancellation_type {
            continue;
        }
        if found.is_some() {
            return Err(Error::MultipleCancellationTokenParameters {
                interface: interface.name.clone(),
                method: method.name.clone(),
            });
        }
        found = Some(index);
    }
    Ok(found)
}

fn argument_fields(method: &MethodDecl, skip: Option<usize>) -> Result<Vec<MemberDescriptor>> {
    let mut fields = Vec::new();
    for (index, param) in method.parameters.iter().enumerate() {
        if Some(index) == skip {
            continue;
        }
        let id = wire_id(fields.len(), method)?;
        fields.push(MemberDescriptor::field(id, param.name.clone(), param.ty.clone()));
    }
    Ok(fields)
}

fn slots(
    fields: &[MemberDescriptor],
    cancellation_parameter_index: Option<usize>,
    token_field_id: Option<u16>,
    method: &MethodDecl,
    config: &SchemaConfig,
) -> Vec<SlotDescriptor> {
    let mut slots: Vec<SlotDescriptor> = fields
        .iter()
        .zip(parameter_indices(method.parameters.len(), cancellation_parameter_index))
        .map(|(field, parameter_index)| SlotDescriptor {
            name: format!("arg{}", field.id),
            ty: field.declared_type.clone(),
            role: SlotRole::Argument { parameter_index },
            id: Some(field.id),
        })
        .collect();

    slots.push(SlotDescriptor {
        name: "holder".to_string(),
        ty: TypeRef::named("TargetHolder"),
        role: SlotRole::Holder,
        id: None,
    });
    slots.push(SlotDescriptor {
        name: "method_info".to_string(),
        ty: TypeRef::named("MethodInfo"),
        role: SlotRole::MethodInfo,
        id: None,
    });

    if let Some(id) = token_field_id {
        slots.push(SlotDescriptor {
            name: "cancellable_token_id".to_string(),
            ty: config.token_id_type.clone(),
            role: SlotRole::CancellableTokenId,
            id: Some(id),
        });
    }
    slots
}

fn parameter_indices(count: usize, skip: Option<usize>) -> impl Iterator<Item = usize> {
    (0..count).filter(move |i| Some(*i) != skip)
}

fn wire_id(ordinal: usize, method: &MethodDecl) -> Result<u16> {
    u16::try_from(ordinal).map_err(|_| {
        Error::Schema(neoschema::Error::IdSpaceExhausted { type_name: method.name.clone() })
    })
}

/// `["inv", family components.., interface, (declaring type,)]`, method id still to come.
fn alias_prefix(family: &DispatchFamily, interface_type: &TypeRef, method: &MethodDecl) -> CompoundAlias {
    let mut alias = CompoundAlias::new().with(AliasComponent::literal(INVOKABLE_TAG));
    for component in &family.alias_components {
        alias.push(component.clone());
    }
    alias.push(AliasComponent::Type(interface_type.clone()));
    if family.is_extension {
        let owner = method.containing_type.clone().unwrap_or_else(|| interface_type.clone());
        alias.push(AliasComponent::Type(owner));
    }
    alias
}

fn unbound_type(name: &str, arity: usize) -> TypeRef {
    if arity == 0 { TypeRef::named(name) } else { TypeRef::unbound_shape(name, arity) }
}

fn generated_type_name(interface: &str, family: &str, method_id: &str, arity: usize) -> String {
    let mut name = format!("Invokable_{}_{}_{}", identifier(interface), identifier(family), identifier(method_id));
    if arity > 0 {
        name.push_str(&format!("_{}", arity));
    }
    name
}

/// Keeps ASCII alphanumerics and `_`; any other char becomes `_<hex>_`, so
/// `A.B` and `A_B` stay distinct. The result is a display name only: the alias,
/// not this name, identifies a method.
fn identifier(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push_str(&format!("_{:x}_", c as u32));
        }
    }
    out
}
