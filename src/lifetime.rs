//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// A registration is singleton when it was given a fixed instance or was
/// marked with `as_singleton()`; otherwise it is transient.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{Injectable, Activation, DiResult, Lifetime, ScopeBuilder};
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &mut Activation<'_>) -> DiResult<Self> { Ok(Clock) }
/// }
///
/// let mut builder = ScopeBuilder::new();
/// builder.with_type::<Clock>().as_self();
/// builder.with_instance(7u8).as_self();
///
/// let lifetimes: Vec<_> = builder.descriptors().iter().map(|d| d.lifetime).collect();
/// assert_eq!(lifetimes, vec![Lifetime::Transient, Lifetime::Singleton]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per container, created while the scope is built
    ///
    /// The instance is shared by every abstract type its registration
    /// answers to, and lives exactly as long as the container.
    Singleton,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// Returns `true` if instances of this lifetime are cached.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}
