//! # Interface Catalog
//!
//! Describes every method of an interface and collects the results across
//! interfaces, rejecting alias collisions.
//!
//! ## Philosophy
//!
//! - **Per-method failure**: A bad method is reported and skipped; its siblings and
//!   unrelated interfaces are still described.
//! - **Stable ordinals**: Generated method ids follow declaration order and count
//!   failing methods too, so fixing one method never renumbers the others.

use std::collections::HashMap;

use tracing::debug;
use tracing::warn;

use neoschema::InterfaceDescription;
use neoschema::SchemaConfig;
use neoschema::validate_dispatch_container;

use crate::alias::CompoundAlias;
use crate::descriptor::InvocationDescriptor;
use crate::descriptor::MethodKey;
use crate::descriptor::build;
use crate::error::Error;
use crate::error::Result;
use crate::family::DispatchFamily;

/// Describes every method of `interface`.
///
/// Fails as a whole only if the interface itself is malformed; otherwise each
/// method yields its own result, in declaration order.
pub fn describe_interface(
    interface: &InterfaceDescription,
    family: &DispatchFamily,
    config: &SchemaConfig,
) -> Result<Vec<Result<InvocationDescriptor>>> {
    validate_dispatch_container(&interface.name, &interface.members)?;

    Ok(interface
        .methods
        .iter()
        .zip(0u32..)
        .map(|(method, generated_id)| build(interface, method, family, config, generated_id))
        .collect())
}

/// Descriptors of a whole program, indexed by alias.
pub struct Catalog {
    config: SchemaConfig,
    descriptors: Vec<InvocationDescriptor>,
    aliases: HashMap<CompoundAlias, usize>,
    diagnostics: Vec<Error>,
}

impl Catalog {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            descriptors: Vec::new(),
            aliases: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Describes `interface` and inserts every method that builds.
    ///
    /// Failures are kept as diagnostics. Returns the number of descriptors added.
    pub fn add_interface(&mut self, interface: &InterfaceDescription, family: &DispatchFamily) -> usize {
        let results = match describe_interface(interface, family, &self.config) {
            Ok(results) => results,
            Err(err) => {
                warn!(interface = %interface.name, error = %err, "interface rejected");
                self.diagnostics.push(err);
                return 0;
            }
        };

        let mut added = 0;
        for result in results {
            match result.and_then(|descriptor| self.insert(descriptor)) {
                Ok(()) => added += 1,
                Err(err) => {
                    warn!(interface = %interface.name, error = %err, "method rejected");
                    self.diagnostics.push(err);
                }
            }
        }
        debug!(interface = %interface.name, added, "interface described");
        added
    }

    /// Inserts one descriptor, refusing it if any of its aliases is taken.
    pub fn insert(&mut self, descriptor: InvocationDescriptor) -> Result<()> {
        for alias in descriptor.aliases() {
            if let Some(&existing) = self.aliases.get(alias) {
                return Err(Error::DuplicateAlias {
                    alias: alias.to_string(),
                    first: self.descriptors[existing].key.to_string(),
                    second: descriptor.key.to_string(),
                });
            }
        }
        // A descriptor may not collide with itself either.
        let own: Vec<&CompoundAlias> = descriptor.aliases().collect();
        for (i, alias) in own.iter().enumerate() {
            if own[..i].contains(alias) {
                return Err(Error::DuplicateAlias {
                    alias: alias.to_string(),
                    first: descriptor.key.to_string(),
                    second: descriptor.key.to_string(),
                });
            }
        }

        let index = self.descriptors.len();
        for alias in descriptor.aliases() {
            self.aliases.insert(alias.clone(), index);
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, alias: &CompoundAlias) -> Option<&InvocationDescriptor> {
        self.aliases.get(alias).map(|&i| &self.descriptors[i])
    }

    pub fn find(&self, key: &MethodKey) -> Option<&InvocationDescriptor> {
        self.descriptors.iter().find(|d| d.key == *key)
    }

    pub fn descriptors(&self) -> &[InvocationDescriptor] {
        &self.descriptors
    }

    /// Declaration errors collected by `add_interface`.
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
