//! # Dispatch Families
//!
//! A dispatch family is the category of runtime object an invocation descriptor
//! extends. It declares which base type to use for which method return shape,
//! the alias components its descriptors inherit, and whether its methods run on
//! the target itself or on a component attached to it (an extension).

use serde::Deserialize;
use serde::Serialize;

use neoschema::TypeRef;

use crate::alias::AliasComponent;

/// A base type descriptors may extend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDispatchType {
    /// The base type; an unbound shape (`Request<_>`) if generic.
    pub ty: TypeRef,
    /// Whether the base type has its own disposal routine.
    pub has_dispose: bool,
}

impl BaseDispatchType {
    pub fn new(ty: TypeRef) -> Self {
        Self { ty, has_dispose: false }
    }

    pub fn with_dispose(mut self) -> Self {
        self.has_dispose = true;
        self
    }
}

/// One row of a family's return-type table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTypeBinding {
    /// Return type shape, either exact (`Task`) or unbound (`Task<_>`).
    pub return_shape: TypeRef,
    pub base: BaseDispatchType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchFamily {
    /// Short name used in generated type names.
    pub key: String,
    /// Components every alias in this family starts with, after the tag.
    pub alias_components: Vec<AliasComponent>,
    /// Methods are attached to a target rather than implemented by it.
    pub is_extension: bool,
    pub base_types: Vec<BaseTypeBinding>,
}

impl DispatchFamily {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            alias_components: Vec::new(),
            is_extension: false,
            base_types: Vec::new(),
        }
    }

    pub fn extension(mut self) -> Self {
        self.is_extension = true;
        self
    }

    pub fn with_alias_component(mut self, component: AliasComponent) -> Self {
        self.alias_components.push(component);
        self
    }

    /// Registers `base` for methods returning `return_shape`.
    pub fn bind(mut self, return_shape: TypeRef, base: BaseDispatchType) -> Self {
        self.base_types.push(BaseTypeBinding { return_shape, base });
        self
    }

    /// Finds the base type for a method returning `return_type`.
    ///
    /// An exact match wins. Failing that, the unbound shape of `return_type` is
    /// looked up and the matched base type is re-bound with the return type's
    /// actual arguments. Returns `None` if neither matches, or if a generic base
    /// type's arity disagrees with the return type.
    pub fn match_return_type(&self, return_type: &TypeRef) -> Option<BaseDispatchType> {
        if let Some(binding) = self.base_types.iter().find(|b| b.return_shape == *return_type) {
            return Some(binding.base.clone());
        }

        let shape = return_type.unbound()?;
        let binding = self.base_types.iter().find(|b| b.return_shape == shape)?;
        let ty = if binding.base.ty.args().is_empty() {
            binding.base.ty.clone()
        } else {
            binding.base.ty.construct(return_type.args())?
        };
        Some(BaseDispatchType { ty, has_dispose: binding.base.has_dispose })
    }
}
