//! Registration model accumulated by the scope builder.

use std::any::Any;
use std::sync::Arc;

use crate::descriptors::RegistrationDescriptor;
use crate::error::DiResult;
use crate::key::TypeKey;
use crate::lifetime::Lifetime;

/// Type-erased shared instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Converts a concrete instance into the form stored under an abstract key.
pub(crate) type Caster = Arc<dyn Fn(Instance) -> DiResult<Instance> + Send + Sync>;

pub(crate) fn identity_caster() -> Caster {
    Arc::new(|instance: Instance| -> DiResult<Instance> { Ok(instance) })
}

/// What a registration produces: a fixed value or a type to activate.
pub(crate) enum Source {
    Instance { value: Instance, concrete: TypeKey },
    Type(TypeKey),
}

/// One configured intent, alive only until `build()` completes.
pub(crate) struct Registration {
    pub(crate) source: Source,
    /// Abstract types with their casters; duplicates collapse onto the first.
    pub(crate) resolution_types: Vec<(TypeKey, Caster)>,
    pub(crate) singleton: bool,
}

impl Registration {
    pub(crate) fn for_type(concrete: TypeKey) -> Self {
        Self {
            source: Source::Type(concrete),
            resolution_types: Vec::new(),
            singleton: false,
        }
    }

    pub(crate) fn for_instance(value: Instance, concrete: TypeKey) -> Self {
        Self {
            source: Source::Instance { value, concrete },
            resolution_types: Vec::new(),
            singleton: true,
        }
    }

    pub(crate) fn add_resolution_type(&mut self, key: TypeKey, caster: Caster) {
        if !self.resolves(&key) {
            self.resolution_types.push((key, caster));
        }
    }

    pub(crate) fn resolves(&self, key: &TypeKey) -> bool {
        self.resolution_types.iter().any(|(k, _)| k == key)
    }

    pub(crate) fn caster_for(&self, key: &TypeKey) -> Option<&Caster> {
        self.resolution_types
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    pub(crate) fn concrete(&self) -> &TypeKey {
        match &self.source {
            Source::Instance { concrete, .. } => concrete,
            Source::Type(concrete) => concrete,
        }
    }

    pub(crate) fn is_type_based(&self) -> bool {
        matches!(self.source, Source::Type(_))
    }

    pub(crate) fn lifetime(&self) -> Lifetime {
        if self.singleton {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }

    pub(crate) fn descriptor(&self) -> RegistrationDescriptor {
        RegistrationDescriptor {
            concrete: self.concrete().clone(),
            resolution_types: self.resolution_types.iter().map(|(k, _)| k.clone()).collect(),
            lifetime: self.lifetime(),
            is_instance: !self.is_type_based(),
        }
    }
}
