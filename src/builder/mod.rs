//! Scope builder module for dependency injection.
//!
//! This module contains the ScopeBuilder type, which accumulates
//! registration intents and turns them into a ServiceContainer.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::activator::{Activation, Activator, Factory, FactoryActivator, Injectable};
use crate::descriptors::RegistrationDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::mapping::{Mapping, TypeMapping};
use crate::options::ActivationOptions;
use crate::provider::{is_capability_marker, ServiceContainer};
use crate::registration::{identity_caster, Caster, Instance, Registration, Source};
use crate::traits::{erase_trait, ServicesProvider};

pub mod module_system;
pub use module_system::*;

/// Accumulates registrations and builds a [`ServiceContainer`].
///
/// `with_type`, `with_instance` and friends append a registration and hand
/// back a [`Registering`] handle; `as_key`, `as_trait`, `as_self` and
/// `as_singleton` on the handle configure that registration only.
///
/// `build()` consumes the builder, so a builder is used exactly once.
///
/// # Examples
///
/// ```
/// use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync { fn now(&self) -> u64; }
/// struct FixedClock;
/// impl Clock for FixedClock { fn now(&self) -> u64 { 1_700_000_000 } }
/// impl Injectable for FixedClock {
///     fn construct(_: &mut Activation<'_>) -> DiResult<Self> { Ok(FixedClock) }
/// }
///
/// let mut builder = ScopeBuilder::new();
/// builder
///     .with_instance(String::from("eu-west-1")).as_self()
///     .with_type::<FixedClock>().as_trait::<dyn Clock>(|c| c as Arc<dyn Clock>).as_singleton();
///
/// let provider = builder.build().unwrap();
/// assert_eq!(provider.get_required_trait::<dyn Clock>().now(), 1_700_000_000);
/// assert_eq!(provider.get_required::<String>().as_str(), "eu-west-1");
/// ```
pub struct ScopeBuilder {
    registrations: Vec<Registration>,
    parent: Option<Arc<dyn ServicesProvider>>,
    activator: FactoryActivator,
}

impl Default for ScopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeBuilder {
    /// Creates an empty builder with no parent.
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            parent: None,
            activator: FactoryActivator::new(),
        }
    }

    // ----- Scope Configuration -----

    /// Sets the parent resolver; the last call wins.
    ///
    /// The built container delegates to the parent for instances and
    /// mappings it does not own. The parent never sees this scope.
    pub fn with_parent(&mut self, parent: Arc<dyn ServicesProvider>) -> &mut Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the activator consulted for concrete types with no factory
    /// wired on this builder.
    pub fn with_activator(&mut self, activator: Arc<dyn Activator>) -> &mut Self {
        self.activator.set_fallback(activator);
        self
    }

    /// Sets cycle and depth limits for activations run by this scope.
    pub fn with_options(&mut self, options: ActivationOptions) -> &mut Self {
        self.activator.set_options(options);
        self
    }

    // ----- Registrations -----

    /// Registers the concrete type `T`, built by [`Injectable::construct`].
    ///
    /// The registration answers no key until `as_self`/`as_key`/`as_trait`
    /// is called on the returned handle.
    pub fn with_type<T: Injectable>(&mut self) -> Registering<'_, T> {
        self.activator.register_type::<T>();
        self.push(Registration::for_type(TypeKey::of::<T>()))
    }

    /// Registers the concrete type `T`, built by `factory`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_di::{Resolver, ScopeBuilder};
    ///
    /// struct Port(u16);
    ///
    /// let mut builder = ScopeBuilder::new();
    /// builder.with_factory(|_| Ok(Port(8080))).as_self();
    ///
    /// let provider = builder.build().unwrap();
    /// assert_eq!(provider.get_required::<Port>().0, 8080);
    /// ```
    pub fn with_factory<T, F>(&mut self, factory: F) -> Registering<'_, T>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&mut Activation<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.activator.register(TypeKey::of::<T>(), move |ctx: &mut Activation<'_>| -> DiResult<Instance> {
            let value = factory(ctx)?;
            Ok(Arc::new(value))
        });
        self.push(Registration::for_type(TypeKey::of::<T>()))
    }

    /// Registers a concrete type by key only.
    ///
    /// The type must be constructible by the activator set through
    /// [`with_activator`](Self::with_activator).
    pub fn with_type_key(&mut self, concrete: TypeKey) -> Registering<'_, dyn Any + Send + Sync> {
        self.push(Registration::for_type(concrete))
    }

    /// Registers an open generic concrete shape and the factory serving every
    /// closed instantiation of it.
    ///
    /// The factory reads the type arguments from
    /// [`Activation::type_args`]. Map an open abstract shape to it with
    /// [`Registering::as_key`].
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_di::{arg, Resolver, ScopeBuilder, TypeKey};
    ///
    /// struct Order;
    /// struct SqlRepository { entity: TypeKey }
    ///
    /// let mut builder = ScopeBuilder::new();
    /// builder
    ///     .with_open_type(TypeKey::open("SqlRepository", 1), |ctx| {
    ///         Ok(arg(SqlRepository { entity: ctx.type_args()[0].clone() }))
    ///     })
    ///     .as_key(TypeKey::open("Repository", 1));
    ///
    /// let provider = builder.build().unwrap();
    /// let request = TypeKey::closed("Repository", [TypeKey::of::<Order>()]);
    /// let repo = provider.get_keyed::<SqlRepository>(&request).unwrap();
    /// assert_eq!(repo.entity, TypeKey::of::<Order>());
    /// ```
    pub fn with_open_type<F>(&mut self, open_concrete: TypeKey, factory: F) -> Registering<'_, dyn Any + Send + Sync>
    where
        F: for<'a> Fn(&mut Activation<'a>) -> DiResult<Instance> + Send + Sync + 'static,
    {
        self.activator.register(open_concrete.clone(), factory);
        self.push(Registration::for_type(open_concrete))
    }

    /// Registers a concrete type by key with an explicit factory.
    pub fn with_type_factory(&mut self, concrete: TypeKey, factory: Factory) -> Registering<'_, dyn Any + Send + Sync> {
        self.activator.register_shared(concrete.clone(), factory);
        self.push(Registration::for_type(concrete))
    }

    /// Registers a pre-built value. Instance registrations are singletons.
    pub fn with_instance<T: Send + Sync + 'static>(&mut self, value: T) -> Registering<'_, T> {
        self.push(Registration::for_instance(Arc::new(value), TypeKey::of::<T>()))
    }

    /// Registers a pre-built trait object under its trait key.
    ///
    /// Shorthand for an instance registration answering `dyn T` only.
    pub fn with_trait_instance<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        let key = TypeKey::of::<T>();
        let mut registration = Registration::for_instance(erase_trait(value), key.clone());
        registration.add_resolution_type(key, identity_caster());
        self.registrations.push(registration);
        self
    }

    fn push<C: ?Sized>(&mut self, registration: Registration) -> Registering<'_, C> {
        self.registrations.push(registration);
        let index = self.registrations.len() - 1;
        Registering {
            builder: self,
            index,
            _concrete: PhantomData,
        }
    }

    // ----- Queries -----

    /// True iff a singleton registration already answers `key`.
    pub fn has_registered_instance(&self, key: &TypeKey) -> bool {
        self.registrations
            .iter()
            .any(|r| r.singleton && r.resolves(key))
    }

    /// Registrations in declaration order, for diagnostics.
    pub fn descriptors(&self) -> Vec<RegistrationDescriptor> {
        self.registrations.iter().map(Registration::descriptor).collect()
    }

    /// Number of registrations so far.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    // ----- Build -----

    /// Builds the container.
    ///
    /// 1. Flattens every type-based registration into the type mapping; an
    ///    abstract key claimed twice fails with [`DiError::DuplicateMapping`].
    /// 2. Materializes every singleton key in declaration order. A key the
    ///    parent chain already supplies is left to the parent. A type-based
    ///    owner is activated once and cached under all of its keys.
    ///
    /// Any failure aborts the build; no partial container is returned.
    pub fn build(self) -> DiResult<ServiceContainer> {
        let ScopeBuilder {
            registrations,
            parent,
            activator,
        } = self;

        debug!(
            registrations = registrations.len(),
            has_parent = parent.is_some(),
            "building scope"
        );

        let mut mapping = TypeMapping::new();
        for registration in &registrations {
            if let Source::Type(concrete) = &registration.source {
                for (key, caster) in &registration.resolution_types {
                    mapping.insert(key.clone(), Mapping::new(concrete.clone(), caster.clone()))?;
                }
            }
        }

        let container = ServiceContainer::new(mapping, parent, Arc::new(activator));

        for registration in registrations.iter().filter(|r| r.singleton) {
            for (key, _) in &registration.resolution_types {
                materialize_singleton(&container, &registrations, key)?;
            }
        }

        debug!(
            mappings = container.mapping_count(),
            singletons = container.singleton_count(),
            "scope built"
        );
        Ok(container)
    }
}

fn materialize_singleton(
    container: &ServiceContainer,
    registrations: &[Registration],
    key: &TypeKey,
) -> DiResult<()> {
    if is_capability_marker(key) {
        warn!(key = %key, "a singleton cannot claim a capability marker, skipping");
        return Ok(());
    }
    if key.is_open() {
        return Err(DiError::UnsatisfiedSingleton(key.clone()));
    }
    if container.try_resolve_instance(key).is_some() {
        trace!(key = %key, "singleton already satisfied");
        return Ok(());
    }

    let owner = registrations
        .iter()
        .find(|r| r.resolves(key))
        .ok_or_else(|| DiError::UnsatisfiedSingleton(key.clone()))?;

    match &owner.source {
        Source::Instance { value, .. } => {
            let caster = owner
                .caster_for(key)
                .ok_or_else(|| DiError::UnsatisfiedSingleton(key.clone()))?;
            container.install(key.clone(), caster(value.clone())?);
        }
        Source::Type(concrete) => {
            debug!(key = %key, concrete = %concrete, "materializing singleton");
            let instance = container.construct(concrete, &[])?;
            for (claimed, caster) in &owner.resolution_types {
                if is_capability_marker(claimed) {
                    continue;
                }
                container.install(claimed.clone(), caster(instance.clone())?);
            }
        }
    }
    Ok(())
}

/// Handle to the registration just added to a [`ScopeBuilder`].
///
/// `C` is the concrete type when it is statically known, which enables
/// [`as_trait`](Registering::as_trait); key-only registrations use
/// `dyn Any + Send + Sync`.
pub struct Registering<'b, C: ?Sized> {
    builder: &'b mut ScopeBuilder,
    index: usize,
    _concrete: PhantomData<fn() -> Box<C>>,
}

impl<'b, C: ?Sized> Registering<'b, C> {
    fn registration(&mut self) -> &mut Registration {
        &mut self.builder.registrations[self.index]
    }

    fn add(mut self, key: TypeKey, caster: Caster) -> Self {
        self.registration().add_resolution_type(key, caster);
        self
    }

    /// Answers `key` with the concrete instance as-is.
    pub fn as_key(self, key: TypeKey) -> Self {
        self.add(key, identity_caster())
    }

    /// Answers `key` with the concrete instance converted by `cast`.
    pub fn as_key_with<F>(self, key: TypeKey, cast: F) -> Self
    where
        F: Fn(Instance) -> DiResult<Instance> + Send + Sync + 'static,
    {
        self.add(key, Arc::new(cast))
    }

    /// Answers the registration's own concrete type.
    pub fn as_self(mut self) -> Self {
        let concrete = self.registration().concrete().clone();
        self.add(concrete, identity_caster())
    }

    /// Marks the registration singleton: one instance per built container.
    pub fn as_singleton(mut self) -> Self {
        self.registration().singleton = true;
        self
    }

    /// The builder, for calls that do not add a registration.
    pub fn builder(&mut self) -> &mut ScopeBuilder {
        &mut *self.builder
    }

    // ----- Chaining -----

    /// See [`ScopeBuilder::with_type`].
    pub fn with_type<T: Injectable>(self) -> Registering<'b, T> {
        let builder = self.builder;
        builder.with_type::<T>()
    }

    /// See [`ScopeBuilder::with_factory`].
    pub fn with_factory<T, F>(self, factory: F) -> Registering<'b, T>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&mut Activation<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        let builder = self.builder;
        builder.with_factory(factory)
    }

    /// See [`ScopeBuilder::with_type_key`].
    pub fn with_type_key(self, concrete: TypeKey) -> Registering<'b, dyn Any + Send + Sync> {
        let builder = self.builder;
        builder.with_type_key(concrete)
    }

    /// See [`ScopeBuilder::with_open_type`].
    pub fn with_open_type<F>(self, open_concrete: TypeKey, factory: F) -> Registering<'b, dyn Any + Send + Sync>
    where
        F: for<'a> Fn(&mut Activation<'a>) -> DiResult<Instance> + Send + Sync + 'static,
    {
        let builder = self.builder;
        builder.with_open_type(open_concrete, factory)
    }

    /// See [`ScopeBuilder::with_instance`].
    pub fn with_instance<T: Send + Sync + 'static>(self, value: T) -> Registering<'b, T> {
        let builder = self.builder;
        builder.with_instance(value)
    }
}

impl<'b, C: Send + Sync + 'static> Registering<'b, C> {
    /// Answers the trait key `dyn I`, upcasting the concrete instance with
    /// `cast` (usually `|c| c as Arc<dyn I>`).
    pub fn as_trait<I>(self, cast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let concrete = TypeKey::of::<C>();
        let caster: Caster = Arc::new(move |instance: Instance| -> DiResult<Instance> {
            let value = instance
                .downcast::<C>()
                .map_err(|_| DiError::TypeMismatch(concrete.clone()))?;
            Ok(erase_trait(cast(value)))
        });
        self.add(TypeKey::of::<I>(), caster)
    }
}
