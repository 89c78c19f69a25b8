//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::mapping::Mapping;
use crate::registration::Instance;

/// Capability to activate a fresh instance, bypassing every cache.
///
/// Resolving `TypeKey::of::<dyn ObjectFactory>()` from a container yields the
/// container itself.
pub trait ObjectFactory: Send + Sync {
    /// Activates a new instance of the type `key` maps to (or of `key`
    /// itself when unmapped).
    ///
    /// `args` are pre-supplied constructor arguments; an argument whose type
    /// matches a dependency is used instead of resolving that dependency.
    fn create(&self, key: &TypeKey, args: &[Instance]) -> DiResult<Instance>;
}

/// Capability to look up the concrete type behind an abstract one.
///
/// Lets child scopes query a parent's mapping without instantiating anything.
pub trait TypeMapper: Send + Sync {
    /// Exact match, then open-generic shape, then the parent chain.
    fn find_mapping(&self, key: &TypeKey) -> Option<Mapping>;
}

/// Core object-safe resolution interface.
///
/// Implemented by [`ServiceContainer`] and by any test double; a child scope
/// holds its parent as `Arc<dyn ServicesProvider>`, so parents can be chained
/// arbitrarily deep.
///
/// Most callers use the [`Resolver`] extension trait, which adds typed
/// accessors on top of these key-based operations.
///
/// [`ServiceContainer`]: crate::ServiceContainer
pub trait ServicesProvider: ObjectFactory + TypeMapper {
    /// Resolves `key` to an instance.
    ///
    /// Order: capability markers, cached singletons, parent instances, then
    /// activation of the mapped concrete type (never cached).
    ///
    /// # Returns
    ///
    /// * `Ok(Instance)` - The resolved instance
    /// * `Err(DiError::NotFound)` - Nothing can provide `key`
    /// * `Err(DiError::Activation)` - The mapped type failed to construct
    fn resolve(&self, key: &TypeKey) -> DiResult<Instance>;

    /// Lenient variant of [`resolve`](Self::resolve).
    ///
    /// Returns `Ok(None)` exactly when `resolve` would fail with `NotFound`
    /// for `key`. Unlike a pure lookup this may activate the mapped type, so
    /// activation failures still surface as errors. Use
    /// [`try_resolve_instance`](Self::try_resolve_instance) for a probe that
    /// never activates and never fails.
    fn try_resolve(&self, key: &TypeKey) -> DiResult<Option<Instance>> {
        match self.resolve(key) {
            Ok(instance) => Ok(Some(instance)),
            Err(DiError::NotFound(missing)) if &missing == key => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Probes for an already existing instance without activating anything:
    /// capability markers, this container's singletons, then the parent chain.
    fn try_resolve_instance(&self, key: &TypeKey) -> Option<Instance>;
}

/// Typed resolution helpers over any [`ServicesProvider`].
///
/// Concrete values are stored as `Arc<T>`; trait bindings are stored as
/// `Arc<Arc<dyn Trait>>`, so [`get`](Self::get) serves the former and
/// [`get_trait`](Self::get_trait) the latter.
///
/// # Examples
///
/// ```
/// use scoped_di::{ScopeBuilder, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String { format!("LOG: {}", msg) }
/// }
///
/// let mut builder = ScopeBuilder::new();
/// builder.with_instance(42usize).as_self();
/// builder
///     .with_instance(ConsoleLogger)
///     .as_trait::<dyn Logger>(|l| l as Arc<dyn Logger>);
///
/// let provider = builder.build().unwrap();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// assert_eq!(provider.get_required_trait::<dyn Logger>().log("hi"), "LOG: hi");
/// ```
pub trait Resolver: ServicesProvider {
    /// Resolves a concrete type registered under its own key.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        downcast_instance(self.resolve(&key)?, &key)
    }

    /// Resolves a trait binding.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        downcast_trait(self.resolve(&key)?, &key)
    }

    /// Resolves an arbitrary key (for example a closed generic) as a `T`.
    fn get_keyed<T: Send + Sync + 'static>(&self, key: &TypeKey) -> DiResult<Arc<T>> {
        downcast_instance(self.resolve(key)?, key)
    }

    /// Resolves an arbitrary key bound to a trait object.
    fn get_keyed_trait<T: ?Sized + Send + Sync + 'static>(&self, key: &TypeKey) -> DiResult<Arc<T>> {
        downcast_trait(self.resolve(key)?, key)
    }

    /// Like [`get`](Self::get) but `Ok(None)` when nothing provides `T`.
    fn try_get<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        let key = TypeKey::of::<T>();
        self.try_resolve(&key)?
            .map(|instance| downcast_instance(instance, &key))
            .transpose()
    }

    /// Resolves a concrete type, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait binding, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the trait cannot be resolved.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Activates a fresh `T`, never returning a cached singleton.
    fn create_typed<T: Send + Sync + 'static>(&self, args: &[Instance]) -> DiResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        downcast_instance(self.create(&key, args)?, &key)
    }

    /// Activates a fresh instance behind a trait binding.
    fn create_trait<T: ?Sized + Send + Sync + 'static>(&self, args: &[Instance]) -> DiResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        downcast_trait(self.create(&key, args)?, &key)
    }
}

impl<R: ServicesProvider + ?Sized> Resolver for R {}

pub(crate) fn downcast_instance<T: Send + Sync + 'static>(
    instance: Instance,
    key: &TypeKey,
) -> DiResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(key.clone()))
}

pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(
    instance: Instance,
    key: &TypeKey,
) -> DiResult<Arc<T>> {
    instance
        .downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(key.clone()))
}

/// Erases a trait object into the `Arc<Arc<dyn Trait>>` storage form.
pub(crate) fn erase_trait<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}
