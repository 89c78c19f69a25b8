//! Object activation: factories per concrete type.
//!
//! The resolver never builds objects itself. It hands a concrete [`TypeKey`]
//! to an [`Activator`], which picks the factory wired for that type and lets
//! the factory pull its dependencies back out of the resolver through an
//! [`Activation`] context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{DiError, DiResult};
use crate::internal::{ActivationGuard, Map};
use crate::key::TypeKey;
use crate::options::ActivationOptions;
use crate::registration::Instance;
use crate::traits::{downcast_instance, downcast_trait, erase_trait, Resolver, ServicesProvider};

/// Factory invoked to construct one concrete type.
pub type Factory = Arc<dyn for<'a> Fn(&mut Activation<'a>) -> DiResult<Instance> + Send + Sync>;

/// Constructs instances of concrete types.
///
/// The contract: pick a way to build `concrete`, resolve each dependency via
/// `provider`, prefer matching `explicit_args`, and fail with
/// [`DiError::Activation`] when a dependency can be neither resolved nor
/// taken from the explicit arguments.
pub trait Activator: Send + Sync {
    /// Builds a new instance of `concrete`.
    fn construct(
        &self,
        concrete: &TypeKey,
        provider: &dyn ServicesProvider,
        explicit_args: &[Instance],
    ) -> DiResult<Instance>;

    /// True if a factory for `concrete` is known.
    fn can_construct(&self, concrete: &TypeKey) -> bool;
}

/// A type that knows how to build itself from resolved dependencies.
///
/// This is the statically checked replacement for constructor discovery:
/// `ScopeBuilder::with_type::<T>()` wires `T::construct` as the factory for
/// `T` at registration time.
///
/// # Examples
///
/// ```
/// use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Repository { config: Arc<Config> }
///
/// impl Injectable for Repository {
///     fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
///         Ok(Repository { config: ctx.get::<Config>()? })
///     }
/// }
///
/// let mut builder = ScopeBuilder::new();
/// builder.with_instance(Config { url: "postgres://localhost".into() }).as_self();
/// builder.with_type::<Repository>().as_self();
///
/// let provider = builder.build().unwrap();
/// let repo = provider.get_required::<Repository>();
/// assert_eq!(repo.config.url, "postgres://localhost");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Builds `Self`, resolving dependencies through `ctx`.
    fn construct(ctx: &mut Activation<'_>) -> DiResult<Self>;
}

/// Factory for an [`Injectable`] type.
pub fn injectable_factory<T: Injectable>() -> Factory {
    Arc::new(|ctx: &mut Activation<'_>| -> DiResult<Instance> {
        let value = T::construct(ctx)?;
        Ok(Arc::new(value))
    })
}

/// Wraps a value as an explicit constructor argument.
pub fn arg<T: Send + Sync + 'static>(value: T) -> Instance {
    Arc::new(value)
}

/// Wraps a trait object as an explicit constructor argument.
pub fn trait_arg<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    erase_trait(value)
}

/// Context passed to factories while a concrete type is being built.
///
/// Explicit arguments are matched by type and consumed: each one satisfies at
/// most one dependency, and always before the resolver is asked.
pub struct Activation<'a> {
    concrete: &'a TypeKey,
    provider: &'a dyn ServicesProvider,
    explicit_args: Vec<Option<Instance>>,
}

impl<'a> Activation<'a> {
    pub(crate) fn new(
        concrete: &'a TypeKey,
        provider: &'a dyn ServicesProvider,
        explicit_args: &[Instance],
    ) -> Self {
        Self {
            concrete,
            provider,
            explicit_args: explicit_args.iter().cloned().map(Some).collect(),
        }
    }

    /// The concrete type being built.
    pub fn concrete(&self) -> &TypeKey {
        self.concrete
    }

    /// Type arguments of the concrete type when it is a closed generic.
    pub fn type_args(&self) -> &[TypeKey] {
        self.concrete.type_args()
    }

    /// The resolver supplying dependencies.
    pub fn provider(&self) -> &dyn ServicesProvider {
        self.provider
    }

    fn take_explicit(&mut self, matches: impl Fn(&(dyn Any + Send + Sync)) -> bool) -> Option<Instance> {
        self.explicit_args
            .iter_mut()
            .find(|slot| slot.as_deref().is_some_and(|arg| matches(arg)))
            .and_then(Option::take)
    }

    /// Resolves a concrete dependency.
    pub fn get<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        if let Some(arg) = self.take_explicit(|a| a.is::<T>()) {
            trace!(dependency = std::any::type_name::<T>(), "using explicit argument");
            return downcast_instance(arg, &TypeKey::of::<T>());
        }
        self.provider
            .get::<T>()
            .map_err(|e| DiError::activation(self.concrete, e))
    }

    /// Resolves a trait dependency.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        if let Some(arg) = self.take_explicit(|a| a.is::<Arc<T>>()) {
            trace!(dependency = std::any::type_name::<T>(), "using explicit argument");
            return downcast_trait(arg, &TypeKey::of::<T>());
        }
        self.provider
            .get_trait::<T>()
            .map_err(|e| DiError::activation(self.concrete, e))
    }

    /// Resolves a dependency stored under an arbitrary key as a `T`.
    pub fn get_keyed<T: Send + Sync + 'static>(&mut self, key: &TypeKey) -> DiResult<Arc<T>> {
        if let Some(arg) = self.take_explicit(|a| a.is::<T>()) {
            return downcast_instance(arg, key);
        }
        self.provider
            .get_keyed::<T>(key)
            .map_err(|e| DiError::activation(self.concrete, e))
    }

    /// Resolves an arbitrary key through the provider, without type checks.
    pub fn get_key(&mut self, key: &TypeKey) -> DiResult<Instance> {
        self.provider
            .resolve(key)
            .map_err(|e| DiError::activation(self.concrete, e))
    }

    /// Resolves an optional dependency; `Ok(None)` when nothing provides it.
    pub fn try_get<T: Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        if let Some(arg) = self.take_explicit(|a| a.is::<T>()) {
            return downcast_instance(arg, &TypeKey::of::<T>()).map(Some);
        }
        self.provider
            .try_get::<T>()
            .map_err(|e| DiError::activation(self.concrete, e))
    }
}

/// Registry of factories per concrete type.
///
/// Factories are keyed by plain or closed keys, or by an open generic shape;
/// an open-shape factory serves every closed instantiation of that shape and
/// reads the type arguments from [`Activation::type_args`]. When no factory
/// matches, the optional fallback activator is consulted.
///
/// # Examples
///
/// ```
/// use scoped_di::{FactoryActivator, ScopeBuilder, Resolver, TypeKey, arg};
/// use std::sync::Arc;
///
/// struct Greeting(String);
///
/// let mut activator = FactoryActivator::new();
/// activator.register(TypeKey::of::<Greeting>(), |_| Ok(arg(Greeting("hello".into()))));
///
/// let mut builder = ScopeBuilder::new();
/// builder.with_activator(Arc::new(activator));
/// builder.with_type_key(TypeKey::of::<Greeting>()).as_self();
///
/// let provider = builder.build().unwrap();
/// assert_eq!(provider.get_required::<Greeting>().0, "hello");
/// ```
#[derive(Default)]
pub struct FactoryActivator {
    factories: Map<TypeKey, Factory>,
    fallback: Option<Arc<dyn Activator>>,
    options: ActivationOptions,
}

impl FactoryActivator {
    /// Creates an empty activator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty activator with the given options.
    pub fn with_options(options: ActivationOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Registers the factory for `key`, replacing any previous one.
    pub fn register<F>(&mut self, key: TypeKey, factory: F) -> &mut Self
    where
        F: for<'a> Fn(&mut Activation<'a>) -> DiResult<Instance> + Send + Sync + 'static,
    {
        self.factories.insert(key, Arc::new(factory));
        self
    }

    /// Registers an already shared factory.
    pub fn register_shared(&mut self, key: TypeKey, factory: Factory) -> &mut Self {
        self.factories.insert(key, factory);
        self
    }

    /// Registers `T::construct` as the factory for `T`.
    pub fn register_type<T: Injectable>(&mut self) -> &mut Self {
        self.register_shared(TypeKey::of::<T>(), injectable_factory::<T>())
    }

    /// Sets the activator consulted when no local factory matches.
    pub fn set_fallback(&mut self, fallback: Arc<dyn Activator>) -> &mut Self {
        self.fallback = Some(fallback);
        self
    }

    /// Replaces the activation options.
    pub fn set_options(&mut self, options: ActivationOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Activation options in effect.
    pub fn options(&self) -> &ActivationOptions {
        &self.options
    }

    /// Number of locally registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True when no local factory is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn factory_for(&self, concrete: &TypeKey) -> Option<&Factory> {
        self.factories.get(concrete).or_else(|| {
            concrete
                .generic_definition()
                .and_then(|open| self.factories.get(&open))
        })
    }
}

impl Activator for FactoryActivator {
    fn construct(
        &self,
        concrete: &TypeKey,
        provider: &dyn ServicesProvider,
        explicit_args: &[Instance],
    ) -> DiResult<Instance> {
        // An open shape has no type arguments to build with
        if let TypeKey::Open(_, arity) = concrete {
            return Err(DiError::activation(
                concrete,
                DiError::GenericArity {
                    shape: concrete.clone(),
                    expected: *arity,
                    actual: 0,
                },
            ));
        }

        let Some(factory) = self.factory_for(concrete) else {
            if let Some(fallback) = &self.fallback {
                trace!(concrete = %concrete, "no local factory, trying fallback activator");
                return fallback.construct(concrete, provider, explicit_args);
            }
            return Err(DiError::activation(concrete, DiError::NoFactory(concrete.clone())));
        };

        let _guard = ActivationGuard::enter(concrete, &self.options)?;
        debug!(concrete = %concrete, explicit_args = explicit_args.len(), "activating");

        let mut ctx = Activation::new(concrete, provider, explicit_args);
        factory(&mut ctx).map_err(|e| {
            debug!(concrete = %concrete, error = %e, "activation failed");
            e
        })
    }

    fn can_construct(&self, concrete: &TypeKey) -> bool {
        self.factory_for(concrete).is_some()
            || self
                .fallback
                .as_ref()
                .is_some_and(|fallback| fallback.can_construct(concrete))
    }
}

impl fmt::Debug for FactoryActivator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryActivator")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("has_fallback", &self.fallback.is_some())
            .field("options", &self.options)
            .finish()
    }
}
