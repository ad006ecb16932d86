//! Structural aliases: the globally unique names under which descriptors are
//! registered and looked up.

use serde::Deserialize;
use serde::Serialize;

use neoschema::TypeRef;

/// Tag that opens every invocation alias.
pub const INVOKABLE_TAG: &str = "inv";

/// One part of a compound alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AliasComponent {
    Literal(String),
    Type(TypeRef),
}

impl AliasComponent {
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }
}

impl std::fmt::Display for AliasComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{}", s),
            Self::Type(ty) => write!(f, "[{}]", ty),
        }
    }
}

/// An ordered sequence of alias components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundAlias(pub Vec<AliasComponent>);

impl CompoundAlias {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: AliasComponent) {
        self.0.push(component);
    }

    pub fn with(mut self, component: AliasComponent) -> Self {
        self.0.push(component);
        self
    }

    pub fn components(&self) -> &[AliasComponent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CompoundAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", component)?;
        }
        write!(f, ")")
    }
}
