//! Abstract-to-concrete type mapping.

use std::fmt;

use tracing::trace;

use crate::error::{DiError, DiResult};
use crate::internal::Map;
use crate::key::TypeKey;
use crate::registration::{Caster, Instance};

/// Result of a successful mapping lookup.
///
/// Carries the concrete type to activate plus the conversion from the
/// activated concrete instance to the form stored under the abstract key.
#[derive(Clone)]
pub struct Mapping {
    concrete: TypeKey,
    cast: Caster,
}

impl Mapping {
    pub(crate) fn new(concrete: TypeKey, cast: Caster) -> Self {
        Self { concrete, cast }
    }

    /// The concrete type the abstract key maps to.
    pub fn concrete(&self) -> &TypeKey {
        &self.concrete
    }

    /// Converts an activated concrete instance to its abstract form.
    pub fn cast(&self, instance: Instance) -> DiResult<Instance> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("concrete", &self.concrete)
            .field("cast", &"<function>")
            .finish()
    }
}

/// Flattened `abstract -> concrete` table of one scope.
#[derive(Default)]
pub(crate) struct TypeMapping {
    entries: Map<TypeKey, Mapping>,
}

impl TypeMapping {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one entry; a key may be claimed only once.
    ///
    /// Open abstract shapes must map to open concrete shapes of the same
    /// arity so that closing them later cannot fail.
    pub(crate) fn insert(&mut self, key: TypeKey, mapping: Mapping) -> DiResult<()> {
        if let TypeKey::Open(_, arity) = &key {
            match mapping.concrete() {
                TypeKey::Open(_, concrete_arity) if concrete_arity == arity => {}
                TypeKey::Open(_, concrete_arity) => {
                    return Err(DiError::GenericArity {
                        shape: mapping.concrete().clone(),
                        expected: *arity,
                        actual: *concrete_arity,
                    });
                }
                other => {
                    return Err(DiError::GenericArity {
                        shape: other.clone(),
                        expected: *arity,
                        actual: 0,
                    });
                }
            }
        }

        if let Some(existing) = self.entries.get(&key) {
            return Err(DiError::DuplicateMapping {
                key,
                existing: existing.concrete().clone(),
                duplicate: mapping.concrete().clone(),
            });
        }
        self.entries.insert(key, mapping);
        Ok(())
    }

    /// Exact match first, then the open shape of a closed generic key.
    pub(crate) fn find_local(&self, key: &TypeKey) -> Option<Mapping> {
        if let Some(mapping) = self.entries.get(key) {
            return Some(mapping.clone());
        }

        let definition = key.generic_definition()?;
        let open = self.entries.get(&definition)?;
        let concrete = open.concrete().make_generic(key.type_args().iter().cloned()).ok()?;
        trace!(requested = %key, concrete = %concrete, "closed open-generic mapping");
        Some(Mapping::new(concrete, open.cast.clone()))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
