//! Registration descriptors for introspection and diagnostics.

use crate::key::TypeKey;
use crate::lifetime::Lifetime;

/// Describes one registration held by a [`ScopeBuilder`].
///
/// Descriptors are a read-only snapshot; they are useful to inspect what a
/// module registered before committing to `build()`.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{ScopeBuilder, TypeKey, Lifetime};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {}
/// struct English;
/// impl Greeter for English {}
///
/// let mut builder = ScopeBuilder::new();
/// builder
///     .with_instance(English)
///     .as_trait::<dyn Greeter>(|e| e as Arc<dyn Greeter>);
///
/// let descriptors = builder.descriptors();
/// assert_eq!(descriptors.len(), 1);
/// assert!(descriptors[0].is_instance);
/// assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
/// assert!(descriptors[0].answers(&TypeKey::of::<dyn Greeter>()));
/// ```
///
/// [`ScopeBuilder`]: crate::ScopeBuilder
#[derive(Debug, Clone)]
pub struct RegistrationDescriptor {
    /// Concrete type built, or the type of the fixed instance
    pub concrete: TypeKey,
    /// Abstract types this registration answers to, in declaration order
    pub resolution_types: Vec<TypeKey>,
    /// Caching behavior
    pub lifetime: Lifetime,
    /// True for `with_instance` registrations
    pub is_instance: bool,
}

impl RegistrationDescriptor {
    /// True if `key` is one of the declared resolution types.
    pub fn answers(&self, key: &TypeKey) -> bool {
        self.resolution_types.iter().any(|k| k == key)
    }

    /// A registration with no resolution types can never be looked up.
    pub fn is_reachable(&self) -> bool {
        !self.resolution_types.is_empty()
    }
}
