//! Service container module.
//!
//! This module contains the ServiceContainer type produced by
//! `ScopeBuilder::build` and the resolution algorithm it implements.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::activator::Activator;
use crate::builder::ScopeBuilder;
use crate::error::{DiError, DiResult};
use crate::internal::Map;
use crate::key::TypeKey;
use crate::mapping::{Mapping, TypeMapping};
use crate::registration::Instance;
use crate::traits::{erase_trait, ObjectFactory, ServicesProvider, TypeMapper};

/// Built, immutable resolver of one scope.
///
/// A `ServiceContainer` answers a request in this order:
///
/// 1. The capability markers `dyn ServicesProvider`, `dyn ObjectFactory` and
///    `dyn TypeMapper` resolve to the container itself.
/// 2. Singletons materialized by `build()` are served from the cache.
/// 3. Instances already held by the parent chain are returned as-is.
/// 4. Otherwise the mapped concrete type is activated, with this container
///    supplying its dependencies. Such instances are never cached.
///
/// # Thread Safety
///
/// The container is `Send + Sync` and cheap to clone (it uses `Arc`
/// internally). The singleton cache is written only while `build()` runs and
/// is read-only afterwards.
///
/// # Memory
///
/// A singleton that keeps the resolver it was given (through a capability
/// marker) forms a reference cycle with the container and is never freed.
/// Resolve what you need in the factory instead of holding the resolver.
///
/// # Examples
///
/// ```
/// use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync { fn name(&self) -> &str; }
/// struct StdoutLogger;
/// impl Logger for StdoutLogger { fn name(&self) -> &str { "stdout" } }
/// impl Injectable for StdoutLogger {
///     fn construct(_: &mut Activation<'_>) -> DiResult<Self> { Ok(StdoutLogger) }
/// }
///
/// let mut root = ScopeBuilder::new();
/// root.with_type::<StdoutLogger>()
///     .as_trait::<dyn Logger>(|l| l as Arc<dyn Logger>)
///     .as_singleton();
/// let root = root.build().unwrap();
///
/// let child = root.create_child_scope().build().unwrap();
/// let a = root.get_required_trait::<dyn Logger>();
/// let b = child.get_required_trait::<dyn Logger>();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    mapping: TypeMapping,
    instances: RwLock<Map<TypeKey, Instance>>,
    parent: Option<Arc<dyn ServicesProvider>>,
    activator: Arc<dyn Activator>,
}

/// True for the keys under which a container exposes itself.
pub fn is_capability_marker(key: &TypeKey) -> bool {
    *key == TypeKey::of::<dyn ServicesProvider>()
        || *key == TypeKey::of::<dyn ObjectFactory>()
        || *key == TypeKey::of::<dyn TypeMapper>()
}

impl ServiceContainer {
    pub(crate) fn new(
        mapping: TypeMapping,
        parent: Option<Arc<dyn ServicesProvider>>,
        activator: Arc<dyn Activator>,
    ) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                mapping,
                instances: RwLock::new(Map::default()),
                parent,
                activator,
            }),
        }
    }

    /// Starts a builder whose parent is this container.
    ///
    /// The builder also falls back to this container's activator, so types
    /// wired here can be activated by the child without being wired again.
    pub fn create_child_scope(&self) -> ScopeBuilder {
        let mut builder = ScopeBuilder::new();
        builder
            .with_parent(Arc::new(self.clone()))
            .with_activator(self.inner.activator.clone());
        builder
    }

    /// The parent resolver, if any.
    pub fn parent(&self) -> Option<&Arc<dyn ServicesProvider>> {
        self.inner.parent.as_ref()
    }

    /// The activator this container hands concrete types to.
    pub fn activator(&self) -> &Arc<dyn Activator> {
        &self.inner.activator
    }

    /// Number of singleton entries cached by this container (not its parents).
    pub fn singleton_count(&self) -> usize {
        self.inner.instances.read().len()
    }

    /// Number of local `abstract -> concrete` mappings.
    pub fn mapping_count(&self) -> usize {
        self.inner.mapping.len()
    }

    /// True if `key` has a locally cached singleton.
    pub fn has_cached(&self, key: &TypeKey) -> bool {
        self.inner.instances.read().contains_key(key)
    }

    fn capability(&self, key: &TypeKey) -> Option<Instance> {
        if *key == TypeKey::of::<dyn ServicesProvider>() {
            Some(erase_trait::<dyn ServicesProvider>(Arc::new(self.clone())))
        } else if *key == TypeKey::of::<dyn ObjectFactory>() {
            Some(erase_trait::<dyn ObjectFactory>(Arc::new(self.clone())))
        } else if *key == TypeKey::of::<dyn TypeMapper>() {
            Some(erase_trait::<dyn TypeMapper>(Arc::new(self.clone())))
        } else {
            None
        }
    }

    fn cached(&self, key: &TypeKey) -> Option<Instance> {
        self.inner.instances.read().get(key).cloned()
    }

    /// Caches `instance` under `key` unless an entry exists already.
    ///
    /// Returns false when the key was taken; the cache is append-only.
    pub(crate) fn install(&self, key: TypeKey, instance: Instance) -> bool {
        let mut instances = self.inner.instances.write();
        if instances.contains_key(&key) {
            return false;
        }
        trace!(key = %key, "installing singleton");
        instances.insert(key, instance);
        true
    }

    /// Runs the activator for `concrete` with this container as the source
    /// of dependencies. No lock is held while the factory runs.
    pub(crate) fn construct(&self, concrete: &TypeKey, args: &[Instance]) -> DiResult<Instance> {
        self.inner.activator.construct(concrete, self, args)
    }

    /// Activates the concrete type behind `key` and casts it to `key`'s form.
    ///
    /// Local mappings are activated here. A mapping inherited from the parent
    /// is activated here too when this container's activator knows the
    /// concrete type, so dependencies see this scope's registrations;
    /// otherwise the parent builds it.
    fn activate(&self, key: &TypeKey, args: &[Instance]) -> DiResult<Instance> {
        let mapping = match self.inner.mapping.find_local(key) {
            Some(mapping) => mapping,
            None => match self.inner.parent.as_ref() {
                Some(parent) => match parent.find_mapping(key) {
                    Some(mapping) if self.inner.activator.can_construct(mapping.concrete()) => mapping,
                    Some(mapping) => {
                        debug!(key = %key, concrete = %mapping.concrete(), "delegating activation to parent");
                        return parent.create(key, args);
                    }
                    None => return Err(DiError::NotFound(key.clone())),
                },
                None => return Err(DiError::NotFound(key.clone())),
            },
        };

        trace!(key = %key, concrete = %mapping.concrete(), "activating mapped type");
        let instance = self.construct(mapping.concrete(), args)?;
        mapping.cast(instance)
    }
}

impl ObjectFactory for ServiceContainer {
    /// Activates a fresh instance, bypassing every cache. An unmapped key is
    /// activated as its own concrete type.
    fn create(&self, key: &TypeKey, args: &[Instance]) -> DiResult<Instance> {
        match self.activate(key, args) {
            Err(DiError::NotFound(missing)) if &missing == key => {
                trace!(key = %key, "no mapping, activating key itself");
                self.construct(key, args)
            }
            other => other,
        }
    }
}

impl TypeMapper for ServiceContainer {
    fn find_mapping(&self, key: &TypeKey) -> Option<Mapping> {
        self.inner.mapping.find_local(key).or_else(|| {
            self.inner
                .parent
                .as_ref()
                .and_then(|parent| parent.find_mapping(key))
        })
    }
}

impl ServicesProvider for ServiceContainer {
    fn resolve(&self, key: &TypeKey) -> DiResult<Instance> {
        if let Some(instance) = self.capability(key) {
            return Ok(instance);
        }
        if let Some(instance) = self.cached(key) {
            return Ok(instance);
        }
        if let Some(parent) = &self.inner.parent {
            if let Some(instance) = parent.try_resolve_instance(key) {
                debug!(key = %key, "resolved from parent scope");
                return Ok(instance);
            }
        }
        self.activate(key, &[])
    }

    fn try_resolve_instance(&self, key: &TypeKey) -> Option<Instance> {
        self.capability(key)
            .or_else(|| self.cached(key))
            .or_else(|| {
                self.inner
                    .parent
                    .as_ref()
                    .and_then(|parent| parent.try_resolve_instance(key))
            })
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("mappings", &self.mapping_count())
            .field("singletons", &self.singleton_count())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
