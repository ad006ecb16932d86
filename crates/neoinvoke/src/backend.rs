//! # Emission Boundary
//!
//! Descriptors are consumed by a `Backend`: a code generator, an assembler, or the
//! direct interpreter in this crate (`DispatchTable`). The backend sees nothing
//! but finished descriptors.

use std::sync::Arc;

use dashmap::DashMap;

use crate::alias::CompoundAlias;
use crate::descriptor::InvocationDescriptor;
use crate::error::Error;
use crate::interface::Catalog;
use crate::invocation::Invocation;

/// Turns descriptors into executable artifacts.
pub trait Backend {
    type Output;
    type Error;

    fn emit(&mut self, descriptor: &InvocationDescriptor) -> Result<Self::Output, Self::Error>;
}

/// Feeds every descriptor of `catalog` to `backend`, stopping at the first failure.
pub fn emit<B: Backend>(catalog: &Catalog, backend: &mut B) -> Result<Vec<B::Output>, B::Error> {
    catalog.descriptors().iter().map(|d| backend.emit(d)).collect()
}

/// Direct-interpreter backend: an alias-indexed table of descriptors from which
/// `Invocation`s are created on demand.
///
/// Lookups and registrations may happen concurrently.
#[derive(Default)]
pub struct DispatchTable {
    entries: DashMap<CompoundAlias, Arc<InvocationDescriptor>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh invocation of the descriptor registered under `alias`.
    pub fn invocation(&self, alias: &CompoundAlias) -> Option<Invocation> {
        self.entries.get(alias).map(|d| Invocation::new(d.value().clone()))
    }

    pub fn descriptor(&self, alias: &CompoundAlias) -> Option<Arc<InvocationDescriptor>> {
        self.entries.get(alias).map(|d| d.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Backend for DispatchTable {
    type Output = Arc<InvocationDescriptor>;
    type Error = Error;

    fn emit(&mut self, descriptor: &InvocationDescriptor) -> Result<Self::Output, Self::Error> {
        if let Some(alias) = descriptor.aliases().find(|a| self.entries.contains_key(*a)) {
            let first = self.entries.get(alias).map(|d| d.key.to_string()).unwrap_or_default();
            return Err(Error::DuplicateAlias {
                alias: alias.to_string(),
                first,
                second: descriptor.key.to_string(),
            });
        }

        let descriptor = Arc::new(descriptor.clone());
        for alias in descriptor.aliases() {
            self.entries.insert(alias.clone(), descriptor.clone());
        }
        Ok(descriptor)
    }
}
